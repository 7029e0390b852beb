//! # Product Repository
//!
//! Catalog CRUD.
//!
//! ## Product Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Unknown scan ──► insert(draft) ──► sell_price = 0  (pending curation)  │
//! │                                          │                              │
//! │                                          │ list(PendingCuration)        │
//! │                                          ▼                              │
//! │  Operator names and prices it ──► update(id, ProductUpdate)             │
//! │                                          │                              │
//! │                                          ▼                              │
//! │  Sellable: get_by_barcode() returns it to registers                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use scanpay_core::{Money, Product, ProductDraft, ProductUpdate, LOW_STOCK_THRESHOLD};

pub(crate) const PRODUCT_COLUMNS: &str = "id, barcode, product_type, manufacturer_code, \
     product_code, name, buy_price_cents, sell_price_cents, discount_bps, stock, \
     created_at, updated_at";

/// Raw `products` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    barcode: String,
    product_type: String,
    manufacturer_code: String,
    product_code: String,
    name: String,
    buy_price_cents: i64,
    sell_price_cents: i64,
    discount_bps: i64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            barcode: row.barcode,
            product_type: row.product_type,
            manufacturer_code: row.manufacturer_code,
            product_code: row.product_code,
            name: row.name,
            buy_price: Money::from_cents(row.buy_price_cents),
            sell_price: Money::from_cents(row.sell_price_cents),
            // CHECK constraint keeps this in 0..=10000
            discount_bps: row.discount_bps.clamp(0, 10_000) as u32,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Which products [`ProductRepository::list`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductFilter {
    #[default]
    All,
    /// Registered from an unknown scan, still without a sell price.
    PendingCuration,
    /// Stock below [`LOW_STOCK_THRESHOLD`].
    LowStock,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by id.
    pub async fn list(&self, filter: ProductFilter) -> DbResult<Vec<Product>> {
        let condition = match filter {
            ProductFilter::All => "",
            ProductFilter::PendingCuration => "WHERE sell_price_cents = 0",
            ProductFilter::LowStock => "WHERE stock < ?1",
        };
        let sql = format!(
            "SELECT {} FROM products {} ORDER BY id",
            PRODUCT_COLUMNS, condition
        );

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        if filter == ProductFilter::LowStock {
            query = query.bind(LOW_STOCK_THRESHOLD);
        }
        let rows = query.fetch_all(&self.pool).await?;

        debug!(count = rows.len(), filter = ?filter, "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets a product by barcode, pending or not.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the barcode already exists.
    pub async fn insert(&self, draft: &ProductDraft) -> DbResult<Product> {
        debug!(barcode = %draft.barcode, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                barcode, product_type, manufacturer_code, product_code, name,
                buy_price_cents, sell_price_cents, discount_bps, stock,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&draft.barcode)
        .bind(&draft.product_type)
        .bind(&draft.manufacturer_code)
        .bind(&draft.product_code)
        .bind(&draft.name)
        .bind(draft.buy_price.cents())
        .bind(draft.sell_price.cents())
        .bind(draft.discount_bps as i64)
        .bind(draft.stock)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: draft.barcode.clone(),
            },
            other => other,
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces the editable fields of a product.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no product has this id.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                buy_price_cents = ?3,
                sell_price_cents = ?4,
                discount_bps = ?5,
                stock = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(update.buy_price.cents())
        .bind(update.sell_price.cents())
        .bind(update.discount_bps as i64)
        .bind(update.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Ledger rows keep their copied name and barcode.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
