//! Shared types and domain logic for the Restaurant Stock Management Platform
//!
//! This crate contains the models and the pure reconciliation engines shared
//! between the backend, the frontend (via WASM), and other components of the
//! system.

pub mod models;
pub mod receiving;
pub mod reconciliation;
pub mod types;

pub use models::*;
pub use types::*;
