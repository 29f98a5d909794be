//! # Catalog Repository
//!
//! Tenant-scoped medicine load/save with the batch list, plus the stock
//! receipt path.
//!
//! The billing engine needs exactly two catalog operations inside its
//! transactions — `find_for_tenant` and `save` — so both are associated
//! functions over a `&mut SqliteConnection`. `save` always recomputes the
//! derived summary columns from the batch list; there is no way to persist
//! a hand-edited aggregate.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use rxtill_core::batch::{restore, Batch, BatchAllocation};
use rxtill_core::types::{Medicine, RegulatoryClass};

/// Repository for medicine/catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

/// Row mirror of the `medicines` table.
#[derive(sqlx::FromRow)]
struct MedicineRow {
    id: String,
    tenant_id: String,
    name: String,
    generic_name: Option<String>,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    reorder_threshold: i64,
    prescription_required: bool,
    regulatory_class: RegulatoryClass,
    total_stock: i64,
    next_expiry: Option<NaiveDate>,
    next_expiry_lot: Option<String>,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BatchRow {
    lot_number: String,
    expiry_date: NaiveDate,
    quantity: i64,
}

impl MedicineRow {
    fn into_medicine(self, batches: Vec<Batch>) -> Medicine {
        Medicine {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            generic_name: self.generic_name,
            unit_price_cents: self.unit_price_cents,
            unit_cost_cents: self.unit_cost_cents,
            reorder_threshold: self.reorder_threshold,
            prescription_required: self.prescription_required,
            regulatory_class: self.regulatory_class,
            batches,
            total_stock: self.total_stock,
            next_expiry: self.next_expiry,
            next_expiry_lot: self.next_expiry_lot,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Transaction-participating operations
    // =========================================================================

    /// Loads a medicine with its batch list, scoped to the tenant.
    ///
    /// Returns `None` for an unknown id, a different tenant's medicine,
    /// or an inactive one.
    pub async fn find_for_tenant(
        conn: &mut SqliteConnection,
        medicine_id: &str,
        tenant_id: &str,
    ) -> DbResult<Option<Medicine>> {
        let row: Option<MedicineRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, generic_name,
                   unit_price_cents, unit_cost_cents, reorder_threshold,
                   prescription_required, regulatory_class,
                   total_stock, next_expiry, next_expiry_lot,
                   is_active, created_at, updated_at
            FROM medicines
            WHERE id = ?1 AND tenant_id = ?2 AND is_active = 1
            "#,
        )
        .bind(medicine_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let batches: Vec<BatchRow> = sqlx::query_as(
            r#"
            SELECT lot_number, expiry_date, quantity
            FROM medicine_batches
            WHERE medicine_id = ?1
            ORDER BY position
            "#,
        )
        .bind(medicine_id)
        .fetch_all(&mut *conn)
        .await?;

        let batches = batches
            .into_iter()
            .map(|b| Batch {
                lot_number: b.lot_number,
                expiry_date: b.expiry_date,
                quantity: b.quantity,
            })
            .collect();

        Ok(Some(row.into_medicine(batches)))
    }

    /// Persists a medicine's batch state.
    ///
    /// Recomputes the summary columns from the batch list, rewrites the
    /// batch rows (position = list order), and bumps `updated_at`. The
    /// identity and pricing columns are left alone; catalog CRUD is a
    /// different subsystem.
    pub async fn save(conn: &mut SqliteConnection, medicine: &mut Medicine) -> DbResult<()> {
        medicine.recompute_summary();
        medicine.updated_at = Utc::now();

        debug!(
            medicine_id = %medicine.id,
            total_stock = medicine.total_stock,
            "saving medicine batch state"
        );

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                total_stock = ?2,
                next_expiry = ?3,
                next_expiry_lot = ?4,
                updated_at = ?5
            WHERE id = ?1 AND tenant_id = ?6
            "#,
        )
        .bind(&medicine.id)
        .bind(medicine.total_stock)
        .bind(medicine.next_expiry)
        .bind(&medicine.next_expiry_lot)
        .bind(medicine.updated_at)
        .bind(&medicine.tenant_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", &medicine.id));
        }

        sqlx::query("DELETE FROM medicine_batches WHERE medicine_id = ?1")
            .bind(&medicine.id)
            .execute(&mut *conn)
            .await?;

        for (position, batch) in medicine.batches.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO medicine_batches (medicine_id, position, lot_number, expiry_date, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&medicine.id)
            .bind(position as i64)
            .bind(&batch.lot_number)
            .bind(batch.expiry_date)
            .bind(batch.quantity)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Inserts a new medicine with its batches (provisioning/seeding).
    pub async fn insert(conn: &mut SqliteConnection, medicine: &mut Medicine) -> DbResult<()> {
        medicine.recompute_summary();

        sqlx::query(
            r#"
            INSERT INTO medicines (
                id, tenant_id, name, generic_name,
                unit_price_cents, unit_cost_cents, reorder_threshold,
                prescription_required, regulatory_class,
                total_stock, next_expiry, next_expiry_lot,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&medicine.id)
        .bind(&medicine.tenant_id)
        .bind(&medicine.name)
        .bind(&medicine.generic_name)
        .bind(medicine.unit_price_cents)
        .bind(medicine.unit_cost_cents)
        .bind(medicine.reorder_threshold)
        .bind(medicine.prescription_required)
        .bind(medicine.regulatory_class)
        .bind(medicine.total_stock)
        .bind(medicine.next_expiry)
        .bind(&medicine.next_expiry_lot)
        .bind(medicine.is_active)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&mut *conn)
        .await?;

        for (position, batch) in medicine.batches.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO medicine_batches (medicine_id, position, lot_number, expiry_date, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&medicine.id)
            .bind(position as i64)
            .bind(&batch.lot_number)
            .bind(batch.expiry_date)
            .bind(batch.quantity)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Merges received stock into a medicine's batch list via the shared
    /// restore primitive: an existing (lot, expiry) pair gains quantity, a
    /// new pair is appended.
    pub async fn receive_stock(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        medicine_id: &str,
        lot_number: &str,
        expiry_date: NaiveDate,
        quantity: i64,
    ) -> DbResult<Medicine> {
        let mut medicine = Self::find_for_tenant(conn, medicine_id, tenant_id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", medicine_id))?;

        let received = [BatchAllocation {
            lot_number: lot_number.to_string(),
            expiry_date,
            quantity,
        }];
        medicine.batches = restore(&medicine.batches, &received);

        Self::save(conn, &mut medicine).await?;
        Ok(medicine)
    }

    // =========================================================================
    // Pool convenience wrappers
    // =========================================================================

    /// Loads a medicine outside any transaction.
    pub async fn get(&self, medicine_id: &str, tenant_id: &str) -> DbResult<Option<Medicine>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_for_tenant(&mut conn, medicine_id, tenant_id).await
    }

    /// Inserts a medicine outside any transaction.
    pub async fn create(&self, medicine: &mut Medicine) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, medicine).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_medicine(tenant: &str, batches: Vec<Batch>) -> Medicine {
        let now = Utc::now();
        Medicine {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant.into(),
            name: "Cetirizine 10mg".into(),
            generic_name: Some("cetirizine".into()),
            unit_price_cents: 800,
            unit_cost_cents: 500,
            reorder_threshold: 20,
            prescription_required: false,
            regulatory_class: RegulatoryClass::Otc,
            batches,
            total_stock: 0,
            next_expiry: None,
            next_expiry_lot: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut med = sample_medicine(
            "t1",
            vec![
                Batch::new("L1", date(2025, 1, 1), 5),
                Batch::new("L2", date(2025, 6, 1), 10),
            ],
        );
        db.medicines().create(&mut med).await.unwrap();
        // Summary was derived on insert.
        assert_eq!(med.total_stock, 15);

        let loaded = db.medicines().get(&med.id, "t1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cetirizine 10mg");
        assert_eq!(loaded.total_stock, 15);
        assert_eq!(loaded.next_expiry, Some(date(2025, 1, 1)));
        assert_eq!(loaded.batches.len(), 2);
        // Position order survives the round trip.
        assert_eq!(loaded.batches[0].lot_number, "L1");
        assert_eq!(loaded.batches[1].lot_number, "L2");
    }

    #[tokio::test]
    async fn test_tenant_scoping() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut med = sample_medicine("t1", vec![]);
        db.medicines().create(&mut med).await.unwrap();

        assert!(db.medicines().get(&med.id, "t2").await.unwrap().is_none());
        assert!(db.medicines().get(&med.id, "t1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_rewrites_batches_and_summary() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut med = sample_medicine("t1", vec![Batch::new("L1", date(2025, 1, 1), 5)]);
        db.medicines().create(&mut med).await.unwrap();

        med.batches[0].quantity = 2;
        med.batches.push(Batch::new("L3", date(2026, 3, 1), 30));
        {
            let mut conn = db.pool().acquire().await.unwrap();
            CatalogRepository::save(&mut conn, &mut med).await.unwrap();
        }

        let loaded = db.medicines().get(&med.id, "t1").await.unwrap().unwrap();
        assert_eq!(loaded.total_stock, 32);
        assert_eq!(loaded.batches.len(), 2);
        assert_eq!(loaded.next_expiry_lot.as_deref(), Some("L1"));
    }

    #[tokio::test]
    async fn test_receive_stock_merges_and_appends() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut med = sample_medicine("t1", vec![Batch::new("L1", date(2025, 1, 1), 5)]);
        db.medicines().create(&mut med).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        // Same (lot, expiry): merge.
        let updated =
            CatalogRepository::receive_stock(&mut conn, "t1", &med.id, "L1", date(2025, 1, 1), 7)
                .await
                .unwrap();
        assert_eq!(updated.total_stock, 12);
        assert_eq!(updated.batches.len(), 1);

        // New lot: append.
        let updated =
            CatalogRepository::receive_stock(&mut conn, "t1", &med.id, "L9", date(2026, 1, 1), 3)
                .await
                .unwrap();
        assert_eq!(updated.total_stock, 15);
        assert_eq!(updated.batches.len(), 2);
    }

    #[tokio::test]
    async fn test_negative_batch_quantity_rejected_by_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut med = sample_medicine("t1", vec![]);
        db.medicines().create(&mut med).await.unwrap();

        let err = sqlx::query(
            "INSERT INTO medicine_batches (medicine_id, position, lot_number, expiry_date, quantity)
             VALUES (?1, 0, 'L1', '2025-01-01', -1)",
        )
        .bind(&med.id)
        .execute(db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();

        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
