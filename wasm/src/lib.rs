//! WebAssembly module for the Restaurant Stock Management Platform
//!
//! Provides client-side computation for the reconciliation screens:
//! - Variance split balance checks ("remaining to assign")
//! - Order line status derivation during receiving
//! - Order receipt totals

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::receiving::*;
pub use shared::reconciliation::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

/// Magnitude still unassigned for one ingredient: `|difference| - sum(splits)`
#[wasm_bindgen]
pub fn remaining_to_assign(difference: f64, split_quantities_json: &str) -> Result<f64, JsValue> {
    let quantities: Vec<f64> = serde_json::from_str(split_quantities_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid quantities JSON: {}", e)))?;

    let assigned: Decimal = quantities.iter().map(|q| to_decimal(*q)).sum();
    let remaining = to_decimal(difference).abs() - assigned;
    Ok(remaining.to_string().parse().unwrap_or(0.0))
}

/// Whether the splits of one ingredient exactly cover its difference
#[wasm_bindgen]
pub fn is_split_balanced(difference: f64, split_quantities_json: &str) -> Result<bool, JsValue> {
    let remaining = remaining_to_assign(difference, split_quantities_json)?;
    Ok(to_decimal(remaining).abs() < shared::types::QUANTITY_TOLERANCE)
}

/// Default reason seeded for a fresh split: count error for a surplus,
/// expiry for a shortage
#[wasm_bindgen]
pub fn default_split_reason(difference: f64) -> String {
    let reason = if difference > 0.0 {
        AdjustmentReason::CountError
    } else {
        AdjustmentReason::Expired
    };
    reason.as_str().to_string()
}

/// Derive a line item's status from ordered vs. received values
#[wasm_bindgen]
pub fn derive_order_line_status(
    ordered_quantity: f64,
    ordered_unit_price: f64,
    received_quantity: f64,
    received_unit_price: f64,
) -> String {
    let status = shared::receiving::derive_line_status(
        to_decimal(ordered_quantity),
        to_decimal(ordered_unit_price),
        to_decimal(received_quantity),
        to_decimal(received_unit_price),
    );
    status.as_str().to_string()
}

/// Compute receipt totals for a set of line items (JSON array of
/// `OrderLineItem`), returned as a JSON object with `total_original`,
/// `total_received` and `variance_total`
#[wasm_bindgen]
pub fn order_receipt_totals(lines_json: &str) -> Result<String, JsValue> {
    let lines: Vec<OrderLineItem> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid line items JSON: {}", e)))?;

    let totals = serde_json::json!({
        "total_original": shared::receiving::total_original(&lines),
        "total_received": shared::receiving::total_received(&lines),
        "variance_total": shared::receiving::variance_total(&lines),
    });
    Ok(totals.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_to_assign() {
        let remaining = remaining_to_assign(-3.0, "[2.0, 0.5]").unwrap();
        assert!((remaining - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_is_split_balanced() {
        assert!(is_split_balanced(-3.0, "[2.0, 1.0]").unwrap());
        assert!(!is_split_balanced(-3.0, "[2.0]").unwrap());
        // Zero difference needs no splits
        assert!(is_split_balanced(0.0, "[]").unwrap());
    }

    #[test]
    fn test_default_split_reason() {
        assert_eq!(default_split_reason(3.0), "count_error");
        assert_eq!(default_split_reason(-3.0), "expired");
    }

    #[test]
    fn test_derive_order_line_status() {
        assert_eq!(derive_order_line_status(10.0, 2.0, 10.005, 2.0), "consolidated");
        assert_eq!(derive_order_line_status(10.0, 2.0, 10.02, 2.0), "variance");
        assert_eq!(derive_order_line_status(10.0, 2.0, 10.0, 2.5), "variance");
    }
}
