//! Stock adjustment audit records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cause attributed to a stock variance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Expired,
    Donated,
    Accident,
    KitchenError,
    CountError,
    Theft,
    /// Catch-all; the free-text note carries the explanation
    Other,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Expired => "expired",
            AdjustmentReason::Donated => "donated",
            AdjustmentReason::Accident => "accident",
            AdjustmentReason::KitchenError => "kitchen_error",
            AdjustmentReason::CountError => "count_error",
            AdjustmentReason::Theft => "theft",
            AdjustmentReason::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expired" => Some(AdjustmentReason::Expired),
            "donated" => Some(AdjustmentReason::Donated),
            "accident" => Some(AdjustmentReason::Accident),
            "kitchen_error" => Some(AdjustmentReason::KitchenError),
            "count_error" => Some(AdjustmentReason::CountError),
            "theft" => Some(AdjustmentReason::Theft),
            "other" => Some(AdjustmentReason::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentReason::Expired => write!(f, "Expired"),
            AdjustmentReason::Donated => write!(f, "Donated"),
            AdjustmentReason::Accident => write!(f, "Accident"),
            AdjustmentReason::KitchenError => write!(f, "Kitchen Error"),
            AdjustmentReason::CountError => write!(f, "Count Error"),
            AdjustmentReason::Theft => write!(f, "Theft"),
            AdjustmentReason::Other => write!(f, "Other"),
        }
    }
}

/// A persisted, append-only audit row produced by a consolidation commit.
///
/// `quantity` is signed: positive for a surplus correction, negative for a
/// shortage. The sign is derived once, at commit, from the snapshot the
/// operator reconciled against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
