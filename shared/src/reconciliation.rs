//! Stock consolidation: snapshots and variance splitting
//!
//! When an operator opens the reconciliation screen, every counted
//! ingredient is turned into a [`StockSnapshot`] capturing the virtual
//! (theoretical) stock, the real (counted) stock and their difference.
//! The operator then splits each non-zero difference into causal
//! adjustments until the splits exactly account for it; only a fully
//! balanced session may be committed.
//!
//! All state here is in-memory and side-effect-free. Imbalance is a
//! queryable condition, never an error: the operations in this module do
//! not fail, they report.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AdjustmentReason, Ingredient};
use crate::types::QUANTITY_TOLERANCE;

/// Point-in-time view of one ingredient's stock, captured when the
/// reconciliation session starts.
///
/// Not persisted; discarded after commit or cancel. The commit applies the
/// values captured here even if the underlying stock moved in the meantime
/// (known staleness window, last write wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSnapshot {
    pub ingredient_id: Uuid,
    pub virtual_stock: Decimal,
    pub real_stock: Decimal,
    /// `real_stock - virtual_stock`: positive means surplus, negative shortage
    pub difference: Decimal,
}

impl StockSnapshot {
    pub fn new(ingredient_id: Uuid, virtual_stock: Decimal, real_stock: Decimal) -> Self {
        Self {
            ingredient_id,
            virtual_stock,
            real_stock,
            difference: real_stock - virtual_stock,
        }
    }

    /// True when the difference is meaningful (outside tolerance).
    ///
    /// Snapshots without variance are trivially balanced and are excluded
    /// from the commit's stock-mutation batch.
    pub fn has_variance(&self) -> bool {
        self.difference.abs() >= QUANTITY_TOLERANCE
    }
}

/// Build snapshots for every ingredient that has a physical count.
///
/// Ingredients never counted are skipped: there is nothing to reconcile
/// against. No side effects.
pub fn build_snapshots(ingredients: &[Ingredient]) -> Vec<StockSnapshot> {
    ingredients
        .iter()
        .filter_map(|ingredient| {
            ingredient
                .real_stock
                .map(|real| StockSnapshot::new(ingredient.id, ingredient.virtual_stock, real))
        })
        .collect()
}

/// One causal slice of an ingredient's variance.
///
/// The quantity is an unsigned magnitude; the direction is implicit in the
/// sign of the snapshot's difference and is only materialized at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceSplit {
    /// Session-local identifier
    pub id: u32,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub note: Option<String>,
}

/// An audit-ready adjustment with the sign reconstructed from its snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedAdjustment {
    pub ingredient_id: Uuid,
    /// Positive for surplus, negative for shortage
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub note: Option<String>,
}

/// One operator's reconciliation session: the captured snapshots plus the
/// mutable variance splits, owned by the caller for its whole lifetime.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationSession {
    snapshots: Vec<StockSnapshot>,
    splits: HashMap<Uuid, Vec<VarianceSplit>>,
    next_split_id: u32,
}

impl ReconciliationSession {
    /// Start a session from captured snapshots, seeding one default split
    /// per ingredient with variance.
    ///
    /// The default covers the whole difference with a plausible reason
    /// (count error for a surplus, expiry for a shortage) that the operator
    /// is expected to refine, so a fresh session is balanced by
    /// construction.
    pub fn new(snapshots: Vec<StockSnapshot>) -> Self {
        let mut session = Self {
            snapshots,
            splits: HashMap::new(),
            next_split_id: 1,
        };

        let defaults: Vec<(Uuid, Decimal, AdjustmentReason)> = session
            .snapshots
            .iter()
            .filter(|s| s.has_variance())
            .map(|s| {
                let reason = if s.difference > Decimal::ZERO {
                    AdjustmentReason::CountError
                } else {
                    AdjustmentReason::Expired
                };
                (s.ingredient_id, s.difference.abs(), reason)
            })
            .collect();

        for (ingredient_id, quantity, reason) in defaults {
            session.push_split(ingredient_id, quantity, reason, None);
        }

        session
    }

    /// Rebuild a session from snapshots and operator-edited splits, e.g.
    /// from a commit request. Split ids are reassigned.
    pub fn from_parts(
        snapshots: Vec<StockSnapshot>,
        splits: Vec<(Uuid, Decimal, AdjustmentReason, Option<String>)>,
    ) -> Self {
        let mut session = Self {
            snapshots,
            splits: HashMap::new(),
            next_split_id: 1,
        };
        for (ingredient_id, quantity, reason, note) in splits {
            session.push_split(ingredient_id, quantity, reason, note);
        }
        session
    }

    pub fn snapshots(&self) -> &[StockSnapshot] {
        &self.snapshots
    }

    pub fn snapshot(&self, ingredient_id: Uuid) -> Option<&StockSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.ingredient_id == ingredient_id)
    }

    /// Splits currently assigned to an ingredient, in insertion order
    pub fn splits(&self, ingredient_id: Uuid) -> &[VarianceSplit] {
        self.splits
            .get(&ingredient_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a zero-quantity split for the operator to fill in. Returns
    /// the new split's id, or `None` if the ingredient has no snapshot.
    pub fn add_split(&mut self, ingredient_id: Uuid) -> Option<u32> {
        self.snapshot(ingredient_id)?;
        Some(self.push_split(ingredient_id, Decimal::ZERO, AdjustmentReason::Expired, None))
    }

    /// Set a split's magnitude. Negative inputs are clamped to zero: the
    /// direction belongs to the snapshot, not the split.
    pub fn update_split_quantity(&mut self, ingredient_id: Uuid, split_id: u32, quantity: Decimal) {
        if let Some(split) = self.split_mut(ingredient_id, split_id) {
            split.quantity = quantity.max(Decimal::ZERO);
        }
    }

    /// Reclassify a split and replace its note
    pub fn update_split_reason(
        &mut self,
        ingredient_id: Uuid,
        split_id: u32,
        reason: AdjustmentReason,
        note: Option<String>,
    ) {
        if let Some(split) = self.split_mut(ingredient_id, split_id) {
            split.reason = reason;
            split.note = note;
        }
    }

    /// Remove one split. Removing the last split of an ingredient with
    /// variance is allowed; the ingredient simply becomes unbalanced and
    /// blocks the commit.
    pub fn remove_split(&mut self, ingredient_id: Uuid, split_id: u32) {
        if let Some(splits) = self.splits.get_mut(&ingredient_id) {
            splits.retain(|s| s.id != split_id);
        }
    }

    /// Magnitude still unassigned for an ingredient: `|difference| - sum`.
    ///
    /// Surfaced to the operator as "remaining to assign"; positive means
    /// the splits fall short, negative means they overshoot.
    pub fn remaining(&self, ingredient_id: Uuid) -> Decimal {
        let target = self
            .snapshot(ingredient_id)
            .map(|s| s.difference.abs())
            .unwrap_or(Decimal::ZERO);
        target - self.assigned(ingredient_id)
    }

    /// Whether the splits of one ingredient exactly cover its difference.
    ///
    /// Ingredients without variance are balanced with zero splits; unknown
    /// ingredients have nothing to reconcile and report balanced too.
    pub fn is_balanced(&self, ingredient_id: Uuid) -> bool {
        match self.snapshot(ingredient_id) {
            Some(snapshot) if snapshot.has_variance() => {
                self.remaining(ingredient_id).abs() < QUANTITY_TOLERANCE
            }
            _ => true,
        }
    }

    /// Commit gate: every ingredient with variance must be individually
    /// balanced.
    pub fn is_all_balanced(&self) -> bool {
        self.snapshots
            .iter()
            .all(|s| self.is_balanced(s.ingredient_id))
    }

    /// Flatten the splits into signed audit adjustments.
    ///
    /// The sign is taken from the snapshot captured at session start, so
    /// the audit trail and the stock mutation can never disagree on
    /// direction. Zero-quantity splits are dropped.
    pub fn signed_adjustments(&self) -> Vec<SignedAdjustment> {
        self.snapshots
            .iter()
            .filter(|s| s.has_variance())
            .flat_map(|snapshot| {
                let sign = if snapshot.difference > Decimal::ZERO {
                    Decimal::ONE
                } else {
                    -Decimal::ONE
                };
                self.splits(snapshot.ingredient_id)
                    .iter()
                    .filter(|split| split.quantity > Decimal::ZERO)
                    .map(move |split| SignedAdjustment {
                        ingredient_id: split.ingredient_id,
                        quantity: split.quantity * sign,
                        reason: split.reason,
                        note: split.note.clone(),
                    })
            })
            .collect()
    }

    fn split_mut(&mut self, ingredient_id: Uuid, split_id: u32) -> Option<&mut VarianceSplit> {
        self.splits
            .get_mut(&ingredient_id)?
            .iter_mut()
            .find(|s| s.id == split_id)
    }

    fn assigned(&self, ingredient_id: Uuid) -> Decimal {
        self.splits(ingredient_id)
            .iter()
            .map(|s| s.quantity)
            .sum()
    }

    fn push_split(
        &mut self,
        ingredient_id: Uuid,
        quantity: Decimal,
        reason: AdjustmentReason,
        note: Option<String>,
    ) -> u32 {
        let id = self.next_split_id;
        self.next_split_id += 1;
        self.splits.entry(ingredient_id).or_default().push(VarianceSplit {
            id,
            ingredient_id,
            quantity,
            reason,
            note,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeasureUnit;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(name: &str, virtual_stock: &str, real_stock: Option<&str>) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            unit: MeasureUnit::Kilogram,
            unit_price: dec("2.50"),
            virtual_stock: dec(virtual_stock),
            real_stock: real_stock.map(dec),
            min_stock: dec("1.0"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshots_skip_uncounted_ingredients() {
        let ingredients = vec![
            ingredient("Tomate", "10.0", Some("7.0")),
            ingredient("Cebolla", "4.0", None),
        ];
        let snapshots = build_snapshots(&ingredients);

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].ingredient_id, ingredients[0].id);
        assert_eq!(snapshots[0].difference, dec("-3.0"));
    }

    #[test]
    fn default_split_balances_by_construction() {
        let shortage = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let surplus = StockSnapshot::new(Uuid::new_v4(), dec("5.0"), dec("8.0"));
        let session = ReconciliationSession::new(vec![shortage.clone(), surplus.clone()]);

        assert!(session.is_all_balanced());

        let shortage_splits = session.splits(shortage.ingredient_id);
        assert_eq!(shortage_splits.len(), 1);
        assert_eq!(shortage_splits[0].quantity, dec("3.0"));
        assert_eq!(shortage_splits[0].reason, AdjustmentReason::Expired);

        let surplus_splits = session.splits(surplus.ingredient_id);
        assert_eq!(surplus_splits.len(), 1);
        assert_eq!(surplus_splits[0].quantity, dec("3.0"));
        assert_eq!(surplus_splits[0].reason, AdjustmentReason::CountError);
    }

    #[test]
    fn zero_difference_is_balanced_with_no_splits() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("5.0"), dec("5.0"));
        let id = snapshot.ingredient_id;
        let session = ReconciliationSession::new(vec![snapshot]);

        assert!(session.splits(id).is_empty());
        assert!(session.is_balanced(id));
        assert!(session.is_all_balanced());
        assert!(session.signed_adjustments().is_empty());
    }

    #[test]
    fn difference_inside_tolerance_counts_as_zero() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("5.0"), dec("5.005"));
        assert!(!snapshot.has_variance());
    }

    #[test]
    fn negative_quantity_is_clamped_to_zero() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let id = snapshot.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snapshot]);
        let split_id = session.splits(id)[0].id;

        session.update_split_quantity(id, split_id, dec("-2.0"));

        assert_eq!(session.splits(id)[0].quantity, Decimal::ZERO);
        assert!(!session.is_balanced(id));
        assert_eq!(session.remaining(id), dec("3.0"));
    }

    #[test]
    fn removing_last_split_blocks_commit() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let id = snapshot.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snapshot]);
        let split_id = session.splits(id)[0].id;

        session.remove_split(id, split_id);

        assert!(session.splits(id).is_empty());
        assert!(!session.is_balanced(id));
        assert!(!session.is_all_balanced());
    }

    #[test]
    fn add_split_requires_a_snapshot() {
        let mut session = ReconciliationSession::new(vec![]);
        assert_eq!(session.add_split(Uuid::new_v4()), None);
    }

    #[test]
    fn shortage_split_produces_negative_signed_adjustments() {
        // Tomate: virtual 10, counted 7, shortage of 3 split as 2 expired + 1 theft
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let id = snapshot.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snapshot]);
        let default_id = session.splits(id)[0].id;

        session.update_split_quantity(id, default_id, dec("2.0"));
        let theft_id = session.add_split(id).unwrap();
        session.update_split_quantity(id, theft_id, dec("1.0"));
        session.update_split_reason(id, theft_id, AdjustmentReason::Theft, None);

        assert!(session.is_balanced(id));
        assert!(session.is_all_balanced());

        let adjustments = session.signed_adjustments();
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].quantity, dec("-2.0"));
        assert_eq!(adjustments[0].reason, AdjustmentReason::Expired);
        assert_eq!(adjustments[1].quantity, dec("-1.0"));
        assert_eq!(adjustments[1].reason, AdjustmentReason::Theft);
    }

    #[test]
    fn surplus_split_produces_positive_signed_adjustment() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("5.0"), dec("8.0"));
        let session = ReconciliationSession::new(vec![snapshot]);

        let adjustments = session.signed_adjustments();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].quantity, dec("3.0"));
        assert_eq!(adjustments[0].reason, AdjustmentReason::CountError);
    }

    #[test]
    fn overshoot_is_reported_as_negative_remaining() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let id = snapshot.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snapshot]);
        let split_id = session.splits(id)[0].id;

        session.update_split_quantity(id, split_id, dec("4.5"));

        assert_eq!(session.remaining(id), dec("-1.5"));
        assert!(!session.is_balanced(id));
    }

    #[test]
    fn one_unbalanced_ingredient_blocks_the_whole_session() {
        let balanced = StockSnapshot::new(Uuid::new_v4(), dec("5.0"), dec("8.0"));
        let broken = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let broken_id = broken.ingredient_id;
        let mut session = ReconciliationSession::new(vec![balanced, broken]);
        let split_id = session.splits(broken_id)[0].id;

        session.update_split_quantity(broken_id, split_id, dec("1.0"));

        assert!(!session.is_all_balanced());
    }

    #[test]
    fn zero_quantity_splits_are_dropped_from_the_audit_batch() {
        let snapshot = StockSnapshot::new(Uuid::new_v4(), dec("10.0"), dec("7.0"));
        let id = snapshot.ingredient_id;
        let mut session = ReconciliationSession::new(vec![snapshot]);
        session.add_split(id).unwrap();

        assert!(session.is_balanced(id));
        assert_eq!(session.signed_adjustments().len(), 1);
    }
}
