//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerance for quantity and price comparisons.
///
/// Stock quantities accumulate through repeated purchase/consumption
/// arithmetic; two values closer than this are considered equal everywhere
/// (splitter balance checks, line-item status derivation).
pub const QUANTITY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Unit of measure for an ingredient
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasureUnit {
    Kilogram,
    Gram,
    Liter,
    Milliliter,
    /// Countable items (eggs, cans, bottles)
    Piece,
}

impl MeasureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureUnit::Kilogram => "kilogram",
            MeasureUnit::Gram => "gram",
            MeasureUnit::Liter => "liter",
            MeasureUnit::Milliliter => "milliliter",
            MeasureUnit::Piece => "piece",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kilogram" => Some(MeasureUnit::Kilogram),
            "gram" => Some(MeasureUnit::Gram),
            "liter" => Some(MeasureUnit::Liter),
            "milliliter" => Some(MeasureUnit::Milliliter),
            "piece" => Some(MeasureUnit::Piece),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeasureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureUnit::Kilogram => write!(f, "kg"),
            MeasureUnit::Gram => write!(f, "g"),
            MeasureUnit::Liter => write!(f, "l"),
            MeasureUnit::Milliliter => write!(f, "ml"),
            MeasureUnit::Piece => write!(f, "pc"),
        }
    }
}

/// Date range for history queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}
