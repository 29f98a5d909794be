//! # Revenue Ledger Repository
//!
//! Signed revenue entries mirroring bill lifecycle events: one `sale`
//! entry per finalized bill, one `void_reversal` (opposite sign, equal
//! magnitude) per void. Entries are written inside the same transaction
//! as the bill mutation they mirror, so ledger and bills never disagree.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use rxtill_core::types::{LedgerEntry, LedgerEntryKind};

/// Repository for revenue ledger entries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: String,
    tenant_id: String,
    bill_number: String,
    kind: LedgerEntryKind,
    amount_cents: i64,
    entry_date: NaiveDate,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        LedgerEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            bill_number: row.bill_number,
            kind: row.kind,
            amount_cents: row.amount_cents,
            entry_date: row.entry_date,
            created_at: row.created_at,
        }
    }
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Inserts a ledger entry inside the caller's transaction.
    pub async fn insert(conn: &mut SqliteConnection, entry: &LedgerEntry) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, tenant_id, bill_number, kind, amount_cents, entry_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.bill_number)
        .bind(entry.kind)
        .bind(entry.amount_cents)
        .bind(entry.entry_date)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// All entries for one bill, oldest first.
    pub async fn entries_for_bill(
        &self,
        tenant_id: &str,
        bill_number: &str,
    ) -> DbResult<Vec<LedgerEntry>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, bill_number, kind, amount_cents, entry_date, created_at
            FROM ledger_entries
            WHERE tenant_id = ?1 AND bill_number = ?2
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id)
        .bind(bill_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    /// Net revenue over an inclusive date range. Voided bills net to zero
    /// because their reversal carries the opposite sign.
    pub async fn net_revenue(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_cents)
            FROM ledger_entries
            WHERE tenant_id = ?1 AND entry_date >= ?2 AND entry_date <= ?3
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(kind: LedgerEntryKind, amount: i64, on: NaiveDate) -> LedgerEntry {
        LedgerEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: "t1".into(),
            bill_number: "IRD-2081-82-000001".into(),
            kind,
            amount_cents: amount,
            entry_date: on,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sale_and_reversal_net_to_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let day = date(2024, 12, 1);
        LedgerRepository::insert(&mut conn, &entry(LedgerEntryKind::Sale, 40680, day))
            .await
            .unwrap();
        LedgerRepository::insert(&mut conn, &entry(LedgerEntryKind::VoidReversal, -40680, day))
            .await
            .unwrap();
        drop(conn);

        let entries = db
            .ledger()
            .entries_for_bill("t1", "IRD-2081-82-000001")
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, LedgerEntryKind::Sale);
        assert_eq!(entries[1].kind, LedgerEntryKind::VoidReversal);

        let net = db.ledger().net_revenue("t1", day, day).await.unwrap();
        assert_eq!(net, 0);
    }

    #[tokio::test]
    async fn test_net_revenue_respects_range_and_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        LedgerRepository::insert(
            &mut conn,
            &entry(LedgerEntryKind::Sale, 1000, date(2024, 12, 1)),
        )
        .await
        .unwrap();
        LedgerRepository::insert(
            &mut conn,
            &entry(LedgerEntryKind::Sale, 2000, date(2024, 12, 15)),
        )
        .await
        .unwrap();
        drop(conn);

        let net = db
            .ledger()
            .net_revenue("t1", date(2024, 12, 1), date(2024, 12, 10))
            .await
            .unwrap();
        assert_eq!(net, 1000);

        let other_tenant = db
            .ledger()
            .net_revenue("t2", date(2024, 1, 1), date(2025, 1, 1))
            .await
            .unwrap();
        assert_eq!(other_tenant, 0);
    }
}
