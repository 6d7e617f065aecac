//! Ingredient master data

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MeasureUnit;

/// An ingredient tracked by the inventory subsystem.
///
/// The ingredient is the single source of truth for current stock:
/// sales decrement `virtual_stock`, order receipts increment it (and
/// overwrite `unit_price`), and consolidation resets it to the last
/// physical count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit: MeasureUnit,
    /// Unit cost, overwritten with the latest receipt price
    pub unit_price: Decimal,
    /// Theoretical quantity from recorded purchases minus recorded consumption
    pub virtual_stock: Decimal,
    /// Last physical count; `None` until the ingredient is counted for the
    /// first time
    pub real_stock: Option<Decimal>,
    /// Reorder threshold
    pub min_stock: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Value of the theoretical stock at the current unit price
    pub fn stock_value(&self) -> Decimal {
        self.virtual_stock * self.unit_price
    }

    /// True when the theoretical stock has fallen below the reorder threshold
    pub fn is_below_minimum(&self) -> bool {
        self.virtual_stock < self.min_stock
    }
}
