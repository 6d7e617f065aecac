//! Tests for the stock consolidation engine
//! Verifies the split balance invariant and the signed audit batch

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::AdjustmentReason;
use shared::reconciliation::{ReconciliationSession, StockSnapshot};
use std::str::FromStr;
use uuid::Uuid;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn snapshot(virtual_stock: &str, real_stock: &str) -> StockSnapshot {
    StockSnapshot::new(Uuid::new_v4(), dec(virtual_stock), dec(real_stock))
}

// =============================================================================
// Balance invariant tests
// An ingredient is balanced when its splits cover |difference| within 0.01
// =============================================================================

mod balance {
    use super::*;

    #[test]
    fn fresh_session_is_balanced_by_construction() {
        let session = ReconciliationSession::new(vec![
            snapshot("10.0", "7.0"),
            snapshot("5.0", "8.0"),
            snapshot("2.0", "2.0"),
        ]);
        assert!(session.is_all_balanced());
    }

    #[test]
    fn partial_assignment_is_unbalanced() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let split_id = session.splits(id)[0].id;

        session.update_split_quantity(id, split_id, dec("2.0"));

        assert!(!session.is_balanced(id));
        assert_eq!(session.remaining(id), dec("1.0"));
    }

    #[test]
    fn splits_within_tolerance_of_difference_are_balanced() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let split_id = session.splits(id)[0].id;

        session.update_split_quantity(id, split_id, dec("2.995"));

        assert!(session.is_balanced(id));
    }

    #[test]
    fn splits_off_by_a_cent_are_not_balanced() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let split_id = session.splits(id)[0].id;

        session.update_split_quantity(id, split_id, dec("2.99"));

        assert!(!session.is_balanced(id));
    }

    #[test]
    fn imbalance_is_reported_not_raised() {
        // Removing every split leaves a queryable unbalanced state
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let split_id = session.splits(id)[0].id;

        session.remove_split(id, split_id);

        assert_eq!(session.remaining(id), dec("3.0"));
        assert!(!session.is_all_balanced());
    }
}

// =============================================================================
// Split editing tests
// =============================================================================

mod split_editing {
    use super::*;

    #[test]
    fn added_split_starts_at_zero_quantity() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);

        let split_id = session.add_split(id).unwrap();
        let split = session
            .splits(id)
            .iter()
            .find(|s| s.id == split_id)
            .unwrap();

        assert_eq!(split.quantity, Decimal::ZERO);
    }

    #[test]
    fn reason_can_be_reclassified_with_a_note() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let split_id = session.splits(id)[0].id;

        session.update_split_reason(
            id,
            split_id,
            AdjustmentReason::Theft,
            Some("freezer door left open overnight".to_string()),
        );

        let split = &session.splits(id)[0];
        assert_eq!(split.reason, AdjustmentReason::Theft);
        assert!(split.note.is_some());
    }

    #[test]
    fn edits_to_unknown_splits_are_ignored() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap.clone()]);

        session.update_split_quantity(id, 999, dec("5.0"));
        session.update_split_quantity(Uuid::new_v4(), 1, dec("5.0"));

        // The seeded default is untouched and the session stays balanced
        assert_eq!(session.splits(id)[0].quantity, dec("3.0"));
        assert!(session.is_all_balanced());
    }
}

// =============================================================================
// Signed audit batch tests
// The sign comes from the snapshot, never from the operator's input
// =============================================================================

mod signed_adjustments {
    use super::*;

    #[test]
    fn shortage_scenario_splits_into_expired_and_theft() {
        // Tomate: virtual 10, counted 7. Operator assigns 2 expired, 1 theft.
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snap]);
        let default_id = session.splits(id)[0].id;

        session.update_split_quantity(id, default_id, dec("2.0"));
        let theft_id = session.add_split(id).unwrap();
        session.update_split_quantity(id, theft_id, dec("1.0"));
        session.update_split_reason(id, theft_id, AdjustmentReason::Theft, None);

        assert!(session.is_all_balanced());

        let batch = session.signed_adjustments();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].quantity, dec("-2.0"));
        assert_eq!(batch[0].reason, AdjustmentReason::Expired);
        assert_eq!(batch[1].quantity, dec("-1.0"));
        assert_eq!(batch[1].reason, AdjustmentReason::Theft);
    }

    #[test]
    fn surplus_adjustments_come_out_positive() {
        let snap = snapshot("5.0", "8.0");
        let session = ReconciliationSession::new(vec![snap]);

        let batch = session.signed_adjustments();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].quantity, dec("3.0"));
    }

    #[test]
    fn no_variance_yields_an_empty_batch() {
        let session = ReconciliationSession::new(vec![snapshot("5.0", "5.0")]);
        assert!(session.signed_adjustments().is_empty());
    }

    #[test]
    fn rebuilt_session_preserves_submitted_splits() {
        let snap = snapshot("10.0", "7.0");
        let id = snap.ingredient_id;
        let session = ReconciliationSession::from_parts(
            vec![snap],
            vec![
                (id, dec("2.0"), AdjustmentReason::Expired, None),
                (id, dec("1.0"), AdjustmentReason::KitchenError, None),
            ],
        );

        assert!(session.is_all_balanced());
        let batch = session.signed_adjustments();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].quantity, dec("-1.0"));
        assert_eq!(batch[1].reason, AdjustmentReason::KitchenError);
    }
}

// =============================================================================
// Property-based tests
// =============================================================================

mod property_tests {
    use super::*;

    /// Stock levels between 0.00 and 100.00 with two decimal places
    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..10_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A fresh session seeds splits that exactly cover every difference
        #[test]
        fn prop_fresh_session_always_balanced(
            virtual_stock in stock_strategy(),
            real_stock in stock_strategy(),
        ) {
            let snap = StockSnapshot::new(Uuid::new_v4(), virtual_stock, real_stock);
            let session = ReconciliationSession::new(vec![snap]);
            prop_assert!(session.is_all_balanced());
        }

        /// Signed adjustments of a balanced session sum to the difference
        #[test]
        fn prop_signed_batch_sums_to_difference(
            virtual_stock in stock_strategy(),
            real_stock in stock_strategy(),
        ) {
            let snap = StockSnapshot::new(Uuid::new_v4(), virtual_stock, real_stock);
            let difference = snap.difference;
            let has_variance = snap.has_variance();
            let session = ReconciliationSession::new(vec![snap]);

            let total: Decimal = session
                .signed_adjustments()
                .iter()
                .map(|a| a.quantity)
                .sum();

            if has_variance {
                prop_assert_eq!(total, difference);
            } else {
                prop_assert_eq!(total, Decimal::ZERO);
            }
        }

        /// Negative split quantities never survive an edit
        #[test]
        fn prop_quantities_clamp_at_zero(
            virtual_stock in stock_strategy(),
            quantity in -10_000i64..0,
        ) {
            let snap = StockSnapshot::new(Uuid::new_v4(), virtual_stock, Decimal::ZERO);
            let id = snap.ingredient_id;
            let mut session = ReconciliationSession::new(vec![snap]);

            if let Some(split_id) = session.add_split(id) {
                session.update_split_quantity(id, split_id, Decimal::new(quantity, 2));
                let split = session
                    .splits(id)
                    .iter()
                    .find(|s| s.id == split_id)
                    .unwrap();
                prop_assert_eq!(split.quantity, Decimal::ZERO);
            }
        }

        /// Remaining-to-assign plus the assigned total always equals |difference|
        #[test]
        fn prop_remaining_complements_assigned(
            virtual_stock in stock_strategy(),
            real_stock in stock_strategy(),
            assigned in stock_strategy(),
        ) {
            let snap = StockSnapshot::new(Uuid::new_v4(), virtual_stock, real_stock);
            let id = snap.ingredient_id;
            let difference = snap.difference;
            let mut session = ReconciliationSession::new(vec![snap]);

            // Replace the default assignment with an arbitrary one
            for split in session.splits(id).to_vec() {
                session.remove_split(id, split.id);
            }
            if let Some(split_id) = session.add_split(id) {
                session.update_split_quantity(id, split_id, assigned);
            }

            prop_assert_eq!(session.remaining(id) + assigned, difference.abs());
        }
    }
}
