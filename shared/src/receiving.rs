//! Order receiving: line-item reconciliation
//!
//! During receiving, each line item of a pending purchase order tracks the
//! received quantity/price against the ordered values and carries a status
//! derived from the comparison. Edits are in-memory until the order is
//! confirmed; the confirmation applies the net stock deltas and freezes the
//! lines.

use rust_decimal::Decimal;

use crate::models::{LineItemStatus, OrderLineItem};
use crate::types::QUANTITY_TOLERANCE;

/// Compare received values against ordered values.
///
/// Returns [`LineItemStatus::Consolidated`] when both quantity and price
/// match within tolerance, [`LineItemStatus::Variance`] otherwise. Never
/// returns [`LineItemStatus::NotDelivered`]: that state is only ever set
/// manually by the operator.
pub fn derive_line_status(
    ordered_quantity: Decimal,
    ordered_unit_price: Decimal,
    received_quantity: Decimal,
    received_unit_price: Decimal,
) -> LineItemStatus {
    let quantity_matches = (received_quantity - ordered_quantity).abs() < QUANTITY_TOLERANCE;
    let price_matches = (received_unit_price - ordered_unit_price).abs() < QUANTITY_TOLERANCE;

    if quantity_matches && price_matches {
        LineItemStatus::Consolidated
    } else {
        LineItemStatus::Variance
    }
}

/// Sum of ordered subtotals over all lines, not-delivered included
pub fn total_original(lines: &[OrderLineItem]) -> Decimal {
    lines.iter().map(OrderLineItem::ordered_subtotal).sum()
}

/// Sum of received subtotals over the accepted lines only
pub fn total_received(lines: &[OrderLineItem]) -> Decimal {
    lines
        .iter()
        .filter(|line| line.counts_toward_received())
        .map(OrderLineItem::received_subtotal)
        .sum()
}

/// `total_received - total_original`; negative when the delivery fell short
pub fn variance_total(lines: &[OrderLineItem]) -> Decimal {
    total_received(lines) - total_original(lines)
}

/// In-memory receiving state for one pending order.
///
/// Editing a received value re-derives the line's status; a manual status
/// override wins over the derivation until the next edit.
#[derive(Debug, Clone)]
pub struct ReceivingSession {
    lines: Vec<OrderLineItem>,
}

impl ReceivingSession {
    pub fn new(lines: Vec<OrderLineItem>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[OrderLineItem] {
        &self.lines
    }

    pub fn line(&self, line_id: uuid::Uuid) -> Option<&OrderLineItem> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Record the delivered quantity and re-derive the status. A line
    /// previously marked not-delivered comes back to the derived state.
    pub fn set_received_quantity(&mut self, line_id: uuid::Uuid, quantity: Decimal) {
        if let Some(line) = self.line_mut(line_id) {
            line.received_quantity = quantity;
            line.status = derive_line_status(
                line.ordered_quantity,
                line.ordered_unit_price,
                line.received_quantity,
                line.received_unit_price,
            );
        }
    }

    /// Record the invoiced unit price and re-derive the status
    pub fn set_received_unit_price(&mut self, line_id: uuid::Uuid, unit_price: Decimal) {
        if let Some(line) = self.line_mut(line_id) {
            line.received_unit_price = unit_price;
            line.status = derive_line_status(
                line.ordered_quantity,
                line.ordered_unit_price,
                line.received_quantity,
                line.received_unit_price,
            );
        }
    }

    /// Explicit operator override; wins over the derivation until the next
    /// quantity/price edit
    pub fn set_status(&mut self, line_id: uuid::Uuid, status: LineItemStatus) {
        if let Some(line) = self.line_mut(line_id) {
            line.status = status;
        }
    }

    pub fn total_original(&self) -> Decimal {
        total_original(&self.lines)
    }

    pub fn total_received(&self) -> Decimal {
        total_received(&self.lines)
    }

    pub fn variance_total(&self) -> Decimal {
        variance_total(&self.lines)
    }

    /// Consume the session, yielding the lines to persist on confirmation
    pub fn into_lines(self) -> Vec<OrderLineItem> {
        self.lines
    }

    fn line_mut(&mut self, line_id: uuid::Uuid) -> Option<&mut OrderLineItem> {
        self.lines.iter_mut().find(|l| l.id == line_id)
    }
}
