//! SQLite-backed coupon table
//!
//! A single `coupons` table with no key and no indices. Reads order by the
//! implicit `rowid`, which follows insertion order.

use crate::{CouponRecord, Discount, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Rows returned by `recent` when the caller has no preference
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

const SCHEMA: &str = include_str!("../migrations/001_coupons.sql");

const SELECT_COLUMNS: &str = "SELECT name, phone, email, ticket_number, unique_id, discount FROM coupons";

pub struct CouponStore {
    pool: SqlitePool,
}

impl CouponStore {
    /// Connect to a `sqlite:` URL, creating the file and table if missing
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("📊 Coupon store opened at {}", database_url);
        Self::with_pool(pool).await
    }

    /// Open a database file by path
    pub async fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("📊 Coupon store opened at {}", path.as_ref().display());
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Pinned to one connection that never
    /// expires, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Append one coupon row
    pub async fn insert(&self, record: &CouponRecord) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            "INSERT INTO coupons (name, phone, email, ticket_number, unique_id, discount) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.email)
        .bind(i64::from(record.ticket_number))
        .bind(&record.unique_id)
        .bind(i64::from(record.discount.amount()))
        .execute(&self.pool)
        .await?;

        debug!("Inserted coupon ticket {}", record.ticket_number);
        Ok(())
    }

    /// Most recently inserted rows, newest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<CouponRecord>> {
        let records = sqlx::query_as::<_, CouponRecord>(&format!(
            "{} ORDER BY rowid DESC LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} recent coupons (limit {})", records.len(), limit);
        Ok(records)
    }

    /// Every row in insertion order
    pub async fn all(&self) -> Result<Vec<CouponRecord>> {
        let records = sqlx::query_as::<_, CouponRecord>(&format!(
            "{} ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Rows carrying `unique_id`, newest first. Identifiers are not unique,
    /// so more than one row can match.
    pub async fn find_by_unique_id(&self, unique_id: &str) -> Result<Vec<CouponRecord>> {
        let records = sqlx::query_as::<_, CouponRecord>(&format!(
            "{} WHERE unique_id = ? ORDER BY rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(unique_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM coupons")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    /// Delete every row. Returns how many were removed.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM coupons")
            .execute(&self.pool)
            .await?;

        info!("🗑️ Cleared {} coupons", result.rows_affected());
        Ok(result.rows_affected())
    }
}

impl<'r> FromRow<'r, SqliteRow> for CouponRecord {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let ticket_number: i64 = row.try_get("ticket_number")?;
        let discount: i64 = row.try_get("discount")?;

        let ticket_number = u32::try_from(ticket_number).map_err(|e| sqlx::Error::ColumnDecode {
            index: "ticket_number".to_string(),
            source: Box::new(e),
        })?;
        let discount = u32::try_from(discount)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount".to_string(),
                source: Box::new(e),
            })
            .and_then(|amount| {
                Discount::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "discount".to_string(),
                    source: Box::new(e),
                })
            })?;

        Ok(CouponRecord {
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            ticket_number,
            unique_id: row.try_get("unique_id")?,
            discount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> CouponRecord {
        CouponRecord {
            name: format!("Customer {}", n),
            phone: format!("+9689000{:04}", n),
            email: format!("customer{}@example.com", n),
            ticket_number: 100_000 + n,
            unique_id: format!("{:0>20}", n),
            discount: Discount::Ten,
        }
    }

    #[tokio::test]
    async fn test_in_memory_insert_and_count() {
        let store = CouponStore::in_memory().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert(&record(1)).await.unwrap();
        store.insert(&record(2)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.all().await.unwrap(), vec![record(1), record(2)]);
    }

    #[tokio::test]
    async fn test_find_by_unique_id() {
        let store = CouponStore::in_memory().await.unwrap();
        store.insert(&record(1)).await.unwrap();
        store.insert(&record(2)).await.unwrap();

        assert_eq!(
            store.find_by_unique_id(&record(2).unique_id).await.unwrap(),
            vec![record(2)]
        );
        assert!(store.find_by_unique_id("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_discount_fails_to_decode() {
        let store = CouponStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO coupons (name, phone, email, ticket_number, unique_id, discount) VALUES ('a', 'b', 'c', 123456, 'x', 15)"
        )
        .execute(&store.pool)
        .await
        .unwrap();

        assert!(store.all().await.is_err());
    }
}
