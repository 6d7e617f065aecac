//! Stock consolidation service: snapshots, the commit transaction and the
//! adjustment audit trail
//!
//! The splitter itself lives in `shared::reconciliation` and runs in-memory
//! (browser side via WASM, and here for the authoritative re-validation).
//! This service is the only place where a consolidation touches the
//! database, and it does so in a single transaction: the stock baselines
//! and the audit rows land together or not at all.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{AdjustmentReason, StockAdjustment};
use shared::reconciliation::{ReconciliationSession, SignedAdjustment, StockSnapshot};
use shared::types::DateRange;

/// Consolidation service
#[derive(Clone)]
pub struct ReconciliationService {
    db: PgPool,
}

/// Database row for an audit adjustment
#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: Uuid,
    ingredient_id: Uuid,
    quantity: Decimal,
    reason: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdjustmentRow> for StockAdjustment {
    type Error = AppError;

    fn try_from(row: AdjustmentRow) -> Result<Self, Self::Error> {
        let reason = AdjustmentReason::parse(&row.reason).ok_or_else(|| {
            AppError::Internal(format!("Unknown adjustment reason '{}'", row.reason))
        })?;
        Ok(StockAdjustment {
            id: row.id,
            ingredient_id: row.ingredient_id,
            quantity: row.quantity,
            reason,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

/// One ingredient's reconciliation as submitted by the operator.
///
/// Carries the snapshot values captured when the session was opened: the
/// commit applies those, not a re-read (accepted staleness window,
/// last write wins).
#[derive(Debug, Deserialize)]
pub struct IngredientConsolidationInput {
    pub ingredient_id: Uuid,
    pub virtual_stock: Decimal,
    pub real_stock: Decimal,
    pub splits: Vec<SplitInput>,
}

/// One causal split as submitted by the operator
#[derive(Debug, Deserialize)]
pub struct SplitInput {
    pub quantity: Decimal,
    pub reason: AdjustmentReason,
    pub note: Option<String>,
}

/// Input for committing a consolidation session
#[derive(Debug, Deserialize)]
pub struct CommitConsolidationInput {
    pub ingredients: Vec<IngredientConsolidationInput>,
}

/// Outcome of a successful consolidation commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitResult {
    pub ingredients_updated: usize,
    pub adjustments_recorded: usize,
    pub committed_at: DateTime<Utc>,
}

/// Net variance per reason over a period
#[derive(Debug, Clone, Serialize)]
pub struct ReasonSummary {
    pub reason: AdjustmentReason,
    /// Signed sum: negative when the reason mostly explains shortages
    pub total_quantity: Decimal,
    pub adjustment_count: i64,
}

/// A validated, ready-to-write consolidation batch
#[derive(Debug)]
struct CommitBatch {
    /// Snapshots with variance only; zero-difference ingredients need no write
    snapshots: Vec<StockSnapshot>,
    adjustments: Vec<SignedAdjustment>,
}

/// Validate a commit request and build the write batch.
///
/// Pure input-to-batch step: duplicate ingredients and negative split
/// magnitudes are rejected, the balance invariant is re-validated against
/// the submitted snapshot values, and an unbalanced session fails closed.
fn prepare_commit(input: &CommitConsolidationInput) -> AppResult<CommitBatch> {
    let mut seen = HashSet::new();
    for ingredient in &input.ingredients {
        if !seen.insert(ingredient.ingredient_id) {
            return Err(AppError::Validation {
                field: "ingredient_id".to_string(),
                message: format!(
                    "Ingredient {} appears more than once in the commit",
                    ingredient.ingredient_id
                ),
                message_es: format!(
                    "El ingrediente {} aparece más de una vez en la consolidación",
                    ingredient.ingredient_id
                ),
            });
        }
        for split in &ingredient.splits {
            if split.quantity < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Split quantities are magnitudes and must not be negative"
                        .to_string(),
                    message_es: "Las cantidades de los ajustes no pueden ser negativas"
                        .to_string(),
                });
            }
        }
    }

    let snapshots: Vec<StockSnapshot> = input
        .ingredients
        .iter()
        .map(|i| StockSnapshot::new(i.ingredient_id, i.virtual_stock, i.real_stock))
        .collect();

    let splits = input
        .ingredients
        .iter()
        .flat_map(|i| {
            i.splits
                .iter()
                .map(|s| (i.ingredient_id, s.quantity, s.reason, s.note.clone()))
        })
        .collect();

    let session = ReconciliationSession::from_parts(snapshots, splits);

    let unbalanced = session
        .snapshots()
        .iter()
        .filter(|s| !session.is_balanced(s.ingredient_id))
        .count();
    if unbalanced > 0 {
        return Err(AppError::UnbalancedAdjustments { count: unbalanced });
    }

    Ok(CommitBatch {
        adjustments: session.signed_adjustments(),
        snapshots: session
            .snapshots()
            .iter()
            .filter(|s| s.has_variance())
            .cloned()
            .collect(),
    })
}

impl ReconciliationService {
    /// Create a new ReconciliationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build point-in-time snapshots for every counted ingredient.
    ///
    /// Ingredients without a physical count are skipped; they cannot be
    /// reconciled yet.
    pub async fn snapshots(&self) -> AppResult<Vec<StockSnapshot>> {
        let rows = sqlx::query_as::<_, (Uuid, Decimal, Decimal)>(
            r#"
            SELECT id, virtual_stock, real_stock
            FROM ingredients
            WHERE real_stock IS NOT NULL
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, virtual_stock, real_stock)| {
                StockSnapshot::new(id, virtual_stock, real_stock)
            })
            .collect())
    }

    /// Commit a consolidation session.
    ///
    /// Re-validates the balance invariant and fails closed; the caller is
    /// expected to have gated the commit already, but the service is the
    /// authority. On success every reconciled ingredient's virtual stock
    /// becomes its counted stock and the signed audit rows are appended,
    /// all inside one transaction.
    pub async fn commit(&self, input: CommitConsolidationInput) -> AppResult<CommitResult> {
        let batch = prepare_commit(&input)?;

        // Ingredients must exist before we start writing
        let ingredient_ids: Vec<Uuid> =
            input.ingredients.iter().map(|i| i.ingredient_id).collect();
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)",
        )
        .bind(&ingredient_ids)
        .fetch_one(&self.db)
        .await?;
        if known as usize != ingredient_ids.len() {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }

        let committed_at = Utc::now();
        self.apply_commit(&batch, committed_at)
            .await
            .map_err(AppError::ConsolidationFailed)?;

        tracing::info!(
            ingredients = batch.snapshots.len(),
            adjustments = batch.adjustments.len(),
            "Consolidation committed"
        );

        Ok(CommitResult {
            ingredients_updated: batch.snapshots.len(),
            adjustments_recorded: batch.adjustments.len(),
            committed_at,
        })
    }

    /// The all-or-nothing write: stock baselines plus audit rows
    async fn apply_commit(
        &self,
        batch: &CommitBatch,
        committed_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        // The count becomes the new baseline; zero-difference ingredients
        // are not in the batch, so no no-op writes happen
        for snapshot in &batch.snapshots {
            sqlx::query(
                r#"
                UPDATE ingredients
                SET virtual_stock = $1, updated_at = $2
                WHERE id = $3
                "#,
            )
            .bind(snapshot.real_stock)
            .bind(committed_at)
            .bind(snapshot.ingredient_id)
            .execute(&mut *tx)
            .await?;
        }

        for adjustment in &batch.adjustments {
            sqlx::query(
                r#"
                INSERT INTO stock_adjustments (ingredient_id, quantity, reason, note, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(adjustment.ingredient_id)
            .bind(adjustment.quantity)
            .bind(adjustment.reason.as_str())
            .bind(&adjustment.note)
            .bind(committed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Adjustment history, newest first, optionally scoped to one ingredient
    pub async fn list_adjustments(
        &self,
        ingredient_id: Option<Uuid>,
    ) -> AppResult<Vec<StockAdjustment>> {
        let rows = match ingredient_id {
            Some(id) => {
                sqlx::query_as::<_, AdjustmentRow>(
                    r#"
                    SELECT id, ingredient_id, quantity, reason, note, created_at
                    FROM stock_adjustments
                    WHERE ingredient_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, AdjustmentRow>(
                    r#"
                    SELECT id, ingredient_id, quantity, reason, note, created_at
                    FROM stock_adjustments
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(StockAdjustment::try_from).collect()
    }

    /// Net variance grouped by reason over a date range (shrinkage report)
    pub async fn variance_summary(&self, range: DateRange) -> AppResult<Vec<ReasonSummary>> {
        let rows = sqlx::query_as::<_, (String, Decimal, i64)>(
            r#"
            SELECT reason, COALESCE(SUM(quantity), 0) as total_quantity, COUNT(*) as adjustment_count
            FROM stock_adjustments
            WHERE created_at::date >= $1 AND created_at::date <= $2
            GROUP BY reason
            ORDER BY reason
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(reason, total_quantity, adjustment_count)| {
                let reason = AdjustmentReason::parse(&reason).ok_or_else(|| {
                    AppError::Internal(format!("Unknown adjustment reason '{}'", reason))
                })?;
                Ok(ReasonSummary {
                    reason,
                    total_quantity,
                    adjustment_count,
                })
            })
            .collect()
    }
}
