//! Purchase order service: creation, listing and receipt confirmation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{LineItemStatus, OrderLineItem, OrderStatus, PurchaseOrder};
use shared::receiving::ReceivingSession;

/// Purchase order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Database row for a purchase order
#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    supplier: String,
    status: String,
    total: Decimal,
    total_received: Option<Decimal>,
    created_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for PurchaseOrder {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status '{}'", row.status)))?;
        Ok(PurchaseOrder {
            id: row.id,
            supplier: row.supplier,
            status,
            total: row.total,
            total_received: row.total_received,
            created_at: row.created_at,
            received_at: row.received_at,
        })
    }
}

/// Database row for an order line item
#[derive(Debug, FromRow)]
struct LineItemRow {
    id: Uuid,
    order_id: Uuid,
    ingredient_id: Uuid,
    ordered_quantity: Decimal,
    ordered_unit_price: Decimal,
    received_quantity: Decimal,
    received_unit_price: Decimal,
    status: String,
}

impl TryFrom<LineItemRow> for OrderLineItem {
    type Error = AppError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let status = LineItemStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown line item status '{}'", row.status))
        })?;
        Ok(OrderLineItem {
            id: row.id,
            order_id: row.order_id,
            ingredient_id: row.ingredient_id,
            ordered_quantity: row.ordered_quantity,
            ordered_unit_price: row.ordered_unit_price,
            received_quantity: row.received_quantity,
            received_unit_price: row.received_unit_price,
            status,
        })
    }
}

/// Input for placing a purchase order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub supplier: String,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Input for confirming an order receipt.
///
/// Lines not mentioned keep their ordered defaults (delivered exactly as
/// ordered).
#[derive(Debug, Deserialize)]
pub struct ConfirmReceiptInput {
    #[serde(default)]
    pub lines: Vec<ReceiveLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveLineInput {
    pub line_item_id: Uuid,
    pub received_quantity: Decimal,
    pub received_unit_price: Decimal,
    /// Manual status override; `None` derives the status from the values
    pub status: Option<LineItemStatus>,
}

/// A purchase order together with its line items
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<OrderLineItem>,
}

/// Outcome of a confirmed receipt
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResult {
    pub order_id: Uuid,
    pub total_original: Decimal,
    pub total_received: Decimal,
    pub variance_total: Decimal,
    pub lines: Vec<OrderLineItem>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Place a purchase order. The order total is the sum of the ordered
    /// subtotals; received values default to the ordered ones.
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<PurchaseOrderWithItems> {
        let supplier = input.supplier.trim().to_string();
        if supplier.is_empty() {
            return Err(AppError::Validation {
                field: "supplier".to_string(),
                message: "Supplier must not be empty".to_string(),
                message_es: "El proveedor no puede estar vacío".to_string(),
            });
        }
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "An order needs at least one line item".to_string(),
                message_es: "Un pedido necesita al menos una línea".to_string(),
            });
        }
        for item in &input.items {
            if item.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Ordered quantity must be positive".to_string(),
                    message_es: "La cantidad pedida debe ser positiva".to_string(),
                });
            }
            if item.unit_price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "unit_price".to_string(),
                    message: "Unit price must not be negative".to_string(),
                    message_es: "El precio unitario no puede ser negativo".to_string(),
                });
            }
        }

        // All referenced ingredients must exist
        let ingredient_ids: Vec<Uuid> = input.items.iter().map(|i| i.ingredient_id).collect();
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT id) FROM ingredients WHERE id = ANY($1)",
        )
        .bind(&ingredient_ids)
        .fetch_one(&self.db)
        .await?;
        let distinct: std::collections::HashSet<Uuid> = ingredient_ids.iter().copied().collect();
        if known as usize != distinct.len() {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }

        let total: Decimal = input
            .items
            .iter()
            .map(|i| i.quantity * i.unit_price)
            .sum();

        let mut tx = self.db.begin().await?;

        let order_row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO purchase_orders (supplier, total)
            VALUES ($1, $2)
            RETURNING id, supplier, status, total, total_received, created_at, received_at
            "#,
        )
        .bind(&supplier)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, LineItemRow>(
                r#"
                INSERT INTO order_line_items (
                    order_id, ingredient_id, ordered_quantity, ordered_unit_price,
                    received_quantity, received_unit_price
                )
                VALUES ($1, $2, $3, $4, $3, $4)
                RETURNING id, order_id, ingredient_id, ordered_quantity, ordered_unit_price,
                          received_quantity, received_unit_price, status
                "#,
            )
            .bind(order_row.id)
            .bind(item.ingredient_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderLineItem::try_from(row)?);
        }

        tx.commit().await?;

        Ok(PurchaseOrderWithItems {
            order: order_row.try_into()?,
            items,
        })
    }

    /// List all purchase orders, newest first
    pub async fn list(&self) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, supplier, status, total, total_received, created_at, received_at
            FROM purchase_orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PurchaseOrder::try_from).collect()
    }

    /// Get an order with its line items
    pub async fn get(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        let order_row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, supplier, status, total, total_received, created_at, received_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items = self.load_items(order_id).await?;

        Ok(PurchaseOrderWithItems {
            order: order_row.try_into()?,
            items,
        })
    }

    /// Confirm the receipt of a pending order.
    ///
    /// Applies the operator's received values and statuses through the
    /// receiving state machine, then in one transaction: freezes the line
    /// items, increments virtual stock and overwrites unit prices for the
    /// delivered lines (last price wins), and marks the order received.
    /// An order whose lines were all marked not delivered confirms with a
    /// zero received total and no stock changes.
    pub async fn confirm_receipt(
        &self,
        order_id: Uuid,
        input: ConfirmReceiptInput,
    ) -> AppResult<ReceiptResult> {
        let order = self.get(order_id).await?;
        if order.order.status != OrderStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "Order {} has already been received",
                order_id
            )));
        }

        for line in &input.lines {
            if line.received_quantity < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "received_quantity".to_string(),
                    message: "Received quantity must not be negative".to_string(),
                    message_es: "La cantidad recibida no puede ser negativa".to_string(),
                });
            }
            if line.received_unit_price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "received_unit_price".to_string(),
                    message: "Received unit price must not be negative".to_string(),
                    message_es: "El precio recibido no puede ser negativo".to_string(),
                });
            }
        }

        let mut session = ReceivingSession::new(order.items);
        for line in &input.lines {
            if session.line(line.line_item_id).is_none() {
                return Err(AppError::NotFound("Order line item".to_string()));
            }
            session.set_received_quantity(line.line_item_id, line.received_quantity);
            session.set_received_unit_price(line.line_item_id, line.received_unit_price);
            if let Some(status) = line.status {
                // Operator override wins over the derived status
                session.set_status(line.line_item_id, status);
            }
        }

        let total_original = session.total_original();
        let total_received = session.total_received();
        let variance_total = session.variance_total();
        let lines = session.into_lines();

        let received_at = Utc::now();
        self.apply_receipt(order_id, &lines, total_received, received_at)
            .await
            .map_err(AppError::ReceiptFailed)?;

        tracing::info!(
            %order_id,
            %total_received,
            %variance_total,
            "Order receipt confirmed"
        );

        Ok(ReceiptResult {
            order_id,
            total_original,
            total_received,
            variance_total,
            lines,
        })
    }

    /// The all-or-nothing receipt write: line items, stock, order status
    async fn apply_receipt(
        &self,
        order_id: Uuid,
        lines: &[OrderLineItem],
        total_received: Decimal,
        received_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        for line in lines {
            sqlx::query(
                r#"
                UPDATE order_line_items
                SET received_quantity = $1, received_unit_price = $2, status = $3
                WHERE id = $4
                "#,
            )
            .bind(line.received_quantity)
            .bind(line.received_unit_price)
            .bind(line.status.as_str())
            .bind(line.id)
            .execute(&mut *tx)
            .await?;

            // Not-delivered lines leave stock and prices untouched
            if line.counts_toward_received() {
                sqlx::query(
                    r#"
                    UPDATE ingredients
                    SET virtual_stock = virtual_stock + $1, unit_price = $2, updated_at = $3
                    WHERE id = $4
                    "#,
                )
                .bind(line.received_quantity)
                .bind(line.received_unit_price)
                .bind(received_at)
                .bind(line.ingredient_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET status = $1, total_received = $2, received_at = $3
            WHERE id = $4
            "#,
        )
        .bind(OrderStatus::Received.as_str())
        .bind(total_received)
        .bind(received_at)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    async fn load_items(&self, order_id: Uuid) -> AppResult<Vec<OrderLineItem>> {
        let rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, order_id, ingredient_id, ordered_quantity, ordered_unit_price,
                   received_quantity, received_unit_price, status
            FROM order_line_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(OrderLineItem::try_from).collect()
    }
}
