//! Authoritative state store integration

pub mod client;
pub mod document;

pub use client::{StoreClient, StoreError};
pub use document::{ShotDocument, StateDocument};
