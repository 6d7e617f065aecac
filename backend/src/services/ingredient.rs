//! Ingredient master data service: CRUD, physical counts, consumption and
//! stock valuation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::Ingredient;
use shared::types::MeasureUnit;

/// Ingredient service for managing master data and running stock
#[derive(Clone)]
pub struct IngredientService {
    db: PgPool,
}

/// Database row for an ingredient
#[derive(Debug, FromRow)]
struct IngredientRow {
    id: Uuid,
    name: String,
    unit: String,
    unit_price: Decimal,
    virtual_stock: Decimal,
    real_stock: Option<Decimal>,
    min_stock: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IngredientRow> for Ingredient {
    type Error = AppError;

    fn try_from(row: IngredientRow) -> Result<Self, Self::Error> {
        let unit = MeasureUnit::parse(&row.unit)
            .ok_or_else(|| AppError::Internal(format!("Unknown measure unit '{}'", row.unit)))?;
        Ok(Ingredient {
            id: row.id,
            name: row.name,
            unit,
            unit_price: row.unit_price,
            virtual_stock: row.virtual_stock,
            real_stock: row.real_stock,
            min_stock: row.min_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const INGREDIENT_COLUMNS: &str =
    "id, name, unit, unit_price, virtual_stock, real_stock, min_stock, created_at, updated_at";

/// Input for creating an ingredient
#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub unit: MeasureUnit,
    pub unit_price: Decimal,
    #[serde(default)]
    pub virtual_stock: Option<Decimal>,
    #[serde(default)]
    pub min_stock: Option<Decimal>,
}

/// Input for updating an ingredient's master data
#[derive(Debug, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

/// Input for entering a physical count
#[derive(Debug, Deserialize)]
pub struct RecordCountInput {
    pub counted_quantity: Decimal,
}

/// Input for recipe-driven consumption (one sale, many ingredients)
#[derive(Debug, Deserialize)]
pub struct RecordConsumptionInput {
    pub items: Vec<ConsumptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumptionItem {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

/// Stock value of one ingredient at the current unit price
#[derive(Debug, Clone, Serialize)]
pub struct IngredientValuation {
    pub ingredient_id: Uuid,
    pub name: String,
    pub virtual_stock: Decimal,
    pub unit_price: Decimal,
    pub stock_value: Decimal,
}

/// Valuation of the whole inventory
#[derive(Debug, Clone, Serialize)]
pub struct StockValuation {
    pub items: Vec<IngredientValuation>,
    pub total_value: Decimal,
}

impl IngredientService {
    /// Create a new IngredientService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an ingredient
    pub async fn create(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name must not be empty".to_string(),
                message_es: "El nombre no puede estar vacío".to_string(),
            });
        }
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price must not be negative".to_string(),
                message_es: "El precio unitario no puede ser negativo".to_string(),
            });
        }

        let virtual_stock = input.virtual_stock.unwrap_or(Decimal::ZERO);
        let min_stock = input.min_stock.unwrap_or(Decimal::ZERO);
        if virtual_stock < Decimal::ZERO || min_stock < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "virtual_stock/min_stock".to_string(),
                message: "Stock quantities must not be negative".to_string(),
                message_es: "Las cantidades de stock no pueden ser negativas".to_string(),
            });
        }

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients (name, unit, unit_price, virtual_stock, min_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INGREDIENT_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(input.unit.as_str())
        .bind(input.unit_price)
        .bind(virtual_stock)
        .bind(min_stock)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// List all ingredients
    pub async fn list(&self) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Ingredient::try_from).collect()
    }

    /// Get an ingredient by id
    pub async fn get(&self, ingredient_id: Uuid) -> AppResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(ingredient_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        row.try_into()
    }

    /// Update an ingredient's master data
    pub async fn update(
        &self,
        ingredient_id: Uuid,
        input: UpdateIngredientInput,
    ) -> AppResult<Ingredient> {
        let existing = self.get(ingredient_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        let min_stock = input.min_stock.unwrap_or(existing.min_stock);

        if name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name must not be empty".to_string(),
                message_es: "El nombre no puede estar vacío".to_string(),
            });
        }
        if unit_price < Decimal::ZERO || min_stock < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price/min_stock".to_string(),
                message: "Price and minimum stock must not be negative".to_string(),
                message_es: "El precio y el stock mínimo no pueden ser negativos".to_string(),
            });
        }

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
            SET name = $1, unit_price = $2, min_stock = $3, updated_at = now()
            WHERE id = $4
            RETURNING {INGREDIENT_COLUMNS}
            "#,
        ))
        .bind(name.trim())
        .bind(unit_price)
        .bind(min_stock)
        .bind(ingredient_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Delete an ingredient
    pub async fn delete(&self, ingredient_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(ingredient_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }

        Ok(())
    }

    /// Enter a physical count for an ingredient.
    ///
    /// Only records what was counted; the virtual stock is left untouched
    /// until a consolidation reconciles the two.
    pub async fn record_count(
        &self,
        ingredient_id: Uuid,
        input: RecordCountInput,
    ) -> AppResult<Ingredient> {
        if input.counted_quantity < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "counted_quantity".to_string(),
                message: "Counted quantity must not be negative".to_string(),
                message_es: "La cantidad contada no puede ser negativa".to_string(),
            });
        }

        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
            SET real_stock = $1, updated_at = now()
            WHERE id = $2
            RETURNING {INGREDIENT_COLUMNS}
            "#,
        ))
        .bind(input.counted_quantity)
        .bind(ingredient_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        row.try_into()
    }

    /// Decrement virtual stock for a recipe's worth of ingredients in one
    /// transaction (a recorded sale).
    pub async fn record_consumption(&self, input: RecordConsumptionInput) -> AppResult<()> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "At least one consumption item is required".to_string(),
                message_es: "Se requiere al menos un ingrediente consumido".to_string(),
            });
        }
        for item in &input.items {
            if item.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Consumed quantity must be positive".to_string(),
                    message_es: "La cantidad consumida debe ser positiva".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        for item in &input.items {
            let result = sqlx::query(
                r#"
                UPDATE ingredients
                SET virtual_stock = virtual_stock - $1, updated_at = now()
                WHERE id = $2
                "#,
            )
            .bind(item.quantity)
            .bind(item.ingredient_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("Ingredient".to_string()));
            }
        }

        tx.commit().await?;

        Ok(())
    }

    /// Ingredients whose theoretical stock fell below their reorder threshold
    pub async fn list_low_stock(&self) -> AppResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE virtual_stock < min_stock ORDER BY name"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Ingredient::try_from).collect()
    }

    /// Value the whole inventory at current unit prices
    pub async fn get_valuation(&self) -> AppResult<StockValuation> {
        let ingredients = self.list().await?;

        let items: Vec<IngredientValuation> = ingredients
            .into_iter()
            .map(|i| IngredientValuation {
                ingredient_id: i.id,
                stock_value: i.stock_value(),
                name: i.name,
                virtual_stock: i.virtual_stock,
                unit_price: i.unit_price,
            })
            .collect();

        let total_value = items.iter().map(|i| i.stock_value).sum();

        Ok(StockValuation { items, total_value })
    }
}
