//! HTTP handlers for the Restaurant Stock Management Platform

pub mod health;
pub mod ingredient;
pub mod order;
pub mod reconciliation;

pub use health::*;
pub use ingredient::*;
pub use order::*;
pub use reconciliation::*;
