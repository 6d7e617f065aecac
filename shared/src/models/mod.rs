//! Domain models for the Restaurant Stock Management Platform

mod adjustment;
mod ingredient;
mod order;

pub use adjustment::*;
pub use ingredient::*;
pub use order::*;
