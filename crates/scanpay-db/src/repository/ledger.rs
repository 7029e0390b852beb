//! # Ledger Repository
//!
//! Records checkouts and the per-product transaction ledger.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      SELECT product by barcode ── missing or pending? ──► ROLLBACK      │
//! │      stock < quantity? ─────────────────────────────────► ROLLBACK      │
//! │      UPDATE products SET stock = stock - quantity                       │
//! │    INSERT INTO checkouts (total, item_count)  → transaction_id          │
//! │    INSERT INTO transactions (one row per line)                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A refused line leaves the catalog exactly as it was.
//!
//! Line totals and the checkout total stay exact until they are written;
//! each `*_cents` column is rounded on its own. Stock left below
//! [`LOW_STOCK_THRESHOLD`] is logged at `warn`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::product::{ProductRow, PRODUCT_COLUMNS};
use scanpay_core::{CheckoutLine, CoreError, LedgerEntry, Money, Product, LOW_STOCK_THRESHOLD};

/// Outcome of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCheckout {
    /// Checkout id; the `TransactionID` printed in the payment QR.
    pub transaction_id: i64,
    pub total: Money,
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    checkout_id: i64,
    barcode: String,
    name: String,
    quantity: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        LedgerEntry {
            id: row.id,
            transaction_id: row.checkout_id,
            barcode: row.barcode,
            name: row.name,
            quantity: row.quantity.max(0) as u32,
            total: Money::from_cents(row.total_cents),
            timestamp: row.created_at,
        }
    }
}

/// A line priced against the catalog, waiting to be written.
struct PricedLine {
    barcode: String,
    name: String,
    quantity: u32,
    unit_price: Money,
    total: Money,
}

/// Repository for the checkout ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Prices, stock-checks and records a checkout atomically.
    ///
    /// `lines` must already be normalized (one line per barcode, quantities
    /// in range); see [`scanpay_core::CheckoutRequest::normalized`].
    ///
    /// ## Errors
    /// - `DbError::Rejected(CoreError::ProductNotFound)`: unknown or pending
    /// - `DbError::Rejected(CoreError::InsufficientStock)`: not enough stock
    pub async fn record_checkout(&self, lines: &[CheckoutLine]) -> DbResult<RecordedCheckout> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let select = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let product: Product = match sqlx::query_as::<_, ProductRow>(&select)
                .bind(&line.barcode)
                .fetch_optional(&mut *tx)
                .await?
            {
                Some(row) => row.into(),
                None => return Err(CoreError::ProductNotFound(line.barcode.clone()).into()),
            };

            if product.is_pending_curation() {
                return Err(CoreError::ProductNotFound(line.barcode.clone()).into());
            }

            let requested = line.quantity as i64;
            if product.stock < requested {
                return Err(CoreError::InsufficientStock {
                    barcode: line.barcode.clone(),
                    available: product.stock,
                    requested,
                }
                .into());
            }

            sqlx::query("UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1")
                .bind(product.id)
                .bind(requested)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            let remaining = product.stock - requested;
            if remaining < LOW_STOCK_THRESHOLD {
                warn!(barcode = %product.barcode, remaining, "Stock running low");
            }

            priced.push(PricedLine {
                unit_price: product.unit_price(),
                total: product.line_total(line.quantity),
                barcode: product.barcode,
                name: product.name,
                quantity: line.quantity,
            });
        }

        let total: Money = priced.iter().map(|p| p.total).sum();

        let checkout = sqlx::query(
            "INSERT INTO checkouts (total_cents, item_count, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(total.cents())
        .bind(priced.len() as i64)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let transaction_id = checkout.last_insert_rowid();

        let mut entries = Vec::with_capacity(priced.len());
        for line in priced {
            let row = sqlx::query(
                r#"
                INSERT INTO transactions (
                    checkout_id, barcode, name, quantity, unit_price_cents, total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(transaction_id)
            .bind(&line.barcode)
            .bind(&line.name)
            .bind(line.quantity as i64)
            .bind(line.unit_price.cents())
            .bind(line.total.cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            debug!(barcode = %line.barcode, quantity = line.quantity, "Ledger row written");

            entries.push(LedgerEntry {
                id: row.last_insert_rowid(),
                transaction_id,
                barcode: line.barcode,
                name: line.name,
                quantity: line.quantity,
                total: line.total,
                timestamp: now,
            });
        }

        tx.commit().await?;

        info!(transaction_id, total = %total, lines = entries.len(), "Checkout recorded");

        Ok(RecordedCheckout {
            transaction_id,
            total,
            entries,
        })
    }

    /// Most recent ledger rows first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, checkout_id, barcode, name, quantity, total_cents, created_at
            FROM transactions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use scanpay_core::{NewProduct, ProductDraft};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = [
            ("5012345678900", Some(349), 0, 10), // Tea
            ("036000291452", Some(1000), 1000, 3), // 10% off
            ("96385074", None, 0, 10),            // pending
        ];
        for (barcode, sell, discount, stock) in products {
            let draft = ProductDraft::from_registration(&NewProduct {
                barcode: Some(barcode.to_string()),
                sell_price: sell.map(Money::from_cents),
                discount_bps: Some(discount),
                stock: Some(stock),
                ..Default::default()
            })
            .unwrap();
            db.products().insert(&draft).await.unwrap();
        }
        db
    }

    fn line(barcode: &str, quantity: u32) -> CheckoutLine {
        CheckoutLine {
            barcode: barcode.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_checkout_prices_and_decrements() {
        let db = seeded().await;

        let recorded = db
            .ledger()
            .record_checkout(&[line("5012345678900", 2), line("036000291452", 1)])
            .await
            .unwrap();

        // 2 × 3.49 + 1 × (10.00 - 10%)
        assert_eq!(recorded.total.cents(), 698 + 900);
        assert_eq!(recorded.entries.len(), 2);
        assert!(recorded.transaction_id > 0);

        let tea = db.products().get_by_barcode("5012345678900").await.unwrap().unwrap();
        assert_eq!(tea.stock, 8);

        let recent = db.ledger().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].barcode, "036000291452");
        assert_eq!(recent[0].transaction_id, recorded.transaction_id);
    }

    #[tokio::test]
    async fn test_discount_applies_to_whole_line() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let draft = ProductDraft::from_registration(&NewProduct {
            barcode: Some("4006381333931".to_string()),
            sell_price: Some(Money::from_cents(99)),
            discount_bps: Some(1500),
            stock: Some(500),
            ..Default::default()
        })
        .unwrap();
        db.products().insert(&draft).await.unwrap();

        let recorded = db
            .ledger()
            .record_checkout(&[line("4006381333931", 100)])
            .await
            .unwrap();

        assert_eq!(recorded.total.to_string(), "$84.15");
        let recent = db.ledger().list_recent(1).await.unwrap();
        assert_eq!(recent[0].total.cents(), 8415);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let db = seeded().await;

        let err = db
            .ledger()
            .record_checkout(&[line("5012345678900", 1), line("036000291452", 4)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));

        // First line's decrement was rolled back
        let tea = db.products().get_by_barcode("5012345678900").await.unwrap().unwrap();
        assert_eq!(tea.stock, 10);
        assert!(db.ledger().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_pending_products_rejected() {
        let db = seeded().await;

        let err = db.ledger().record_checkout(&[line("0000", 1)]).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(_))));

        let err = db.ledger().record_checkout(&[line("96385074", 1)]).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(_))));
    }
}
