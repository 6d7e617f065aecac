//! Business logic services for the Restaurant Stock Management Platform

pub mod ingredient;
pub mod order;
pub mod reconciliation;

pub use ingredient::IngredientService;
pub use order::OrderService;
pub use reconciliation::ReconciliationService;
