//! Database models for the Restaurant Stock Management Platform
//!
//! Re-exports models from the shared crate; row-mapping types specific to a
//! service live next to that service.

pub use shared::models::*;
