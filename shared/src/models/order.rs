//! Purchase order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchase order sent to a supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub supplier: String,
    pub status: OrderStatus,
    /// Sum of ordered subtotals over all line items
    pub total: Decimal,
    /// Sum of accepted subtotals, set when the order is received
    pub total_received: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a purchase order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Received,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Received => "received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "received" => Some(OrderStatus::Received),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Received => write!(f, "Received"),
        }
    }
}

/// A single ingredient entry within a purchase order.
///
/// Received quantity/price default to the ordered values and are only
/// mutated during the receiving workflow; once the order is received the
/// line is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub ingredient_id: Uuid,
    pub ordered_quantity: Decimal,
    pub ordered_unit_price: Decimal,
    pub received_quantity: Decimal,
    pub received_unit_price: Decimal,
    pub status: LineItemStatus,
}

impl OrderLineItem {
    pub fn ordered_subtotal(&self) -> Decimal {
        self.ordered_quantity * self.ordered_unit_price
    }

    pub fn received_subtotal(&self) -> Decimal {
        self.received_quantity * self.received_unit_price
    }

    /// Not-delivered lines are excluded from stock application and from the
    /// received total
    pub fn counts_toward_received(&self) -> bool {
        self.status != LineItemStatus::NotDelivered
    }
}

/// Reconciliation status of an order line item during receiving
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineItemStatus {
    /// Received values match the ordered values
    Consolidated,
    /// Quantity or price differs from the ordered values
    Variance,
    /// Line was not delivered at all
    NotDelivered,
}

impl LineItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::Consolidated => "consolidated",
            LineItemStatus::Variance => "variance",
            LineItemStatus::NotDelivered => "not_delivered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "consolidated" => Some(LineItemStatus::Consolidated),
            "variance" => Some(LineItemStatus::Variance),
            "not_delivered" => Some(LineItemStatus::NotDelivered),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItemStatus::Consolidated => write!(f, "Consolidated"),
            LineItemStatus::Variance => write!(f, "Variance"),
            LineItemStatus::NotDelivered => write!(f, "Not Delivered"),
        }
    }
}
