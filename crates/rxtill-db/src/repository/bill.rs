//! # Bill Repository
//!
//! Persistence for the write-once bill graph: the bill row, its line
//! items, and each line's batch allocations.
//!
//! ## No general update path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Repository API                               │
//! │                                                                         │
//! │  insert_finalized()            ← the only creation path                │
//! │  transition_to_voided()        ← the only status transition           │
//! │  update_prescription_status()  ← the only other sanctioned mutation   │
//! │  find_by_id / number / request_id                                      │
//! │                                                                         │
//! │  Anything else hits the write-once triggers and aborts.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use rxtill_core::batch::BatchAllocation;
use rxtill_core::bill::{Bill, BillItem, BillStatus, ExpiredAllocation, OverrideApproval};
use rxtill_core::types::{PaymentMethod, Prescription, PrescriptionStatus};

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

/// Row mirror of the `bills` table.
#[derive(sqlx::FromRow)]
struct BillRow {
    id: String,
    tenant_id: String,
    bill_number: String,
    client_request_id: Option<String>,
    fiscal_year: String,
    sequence: i64,
    customer_name: String,
    customer_contact: Option<String>,
    status: BillStatus,
    payment_method: PaymentMethod,
    billing_date: NaiveDate,
    subtotal_cents: i64,
    discount_bps: u32,
    discount_cents: i64,
    taxable_cents: i64,
    tax_bps: u32,
    tax_cents: i64,
    grand_total_cents: i64,
    prescription_kind: String,
    prescription_ref: Option<String>,
    prescription_status: PrescriptionStatus,
    prescription_note: Option<String>,
    override_approved_by: Option<String>,
    override_reason: Option<String>,
    override_token_id: Option<String>,
    voided_at: Option<DateTime<Utc>>,
    void_reason: Option<String>,
    voided_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BillItemRow {
    id: String,
    medicine_id: String,
    medicine_name: String,
    quantity: i64,
    unit_rate_cents: i64,
    unit_cost_cents: i64,
    line_total_cents: i64,
    line_profit_cents: i64,
    requires_override: bool,
}

#[derive(sqlx::FromRow)]
struct AllocationRow {
    lot_number: String,
    expiry_date: NaiveDate,
    quantity: i64,
    expired: bool,
}

const BILL_COLUMNS: &str = r#"
    id, tenant_id, bill_number, client_request_id, fiscal_year, sequence,
    customer_name, customer_contact, status, payment_method, billing_date,
    subtotal_cents, discount_bps, discount_cents, taxable_cents,
    tax_bps, tax_cents, grand_total_cents,
    prescription_kind, prescription_ref, prescription_status, prescription_note,
    override_approved_by, override_reason, override_token_id,
    voided_at, void_reason, voided_by, created_at
"#;

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    // =========================================================================
    // Transaction-participating operations
    // =========================================================================

    /// Inserts a finalized bill with its items and allocations.
    ///
    /// A unique violation on (tenant, bill number) or (tenant, client
    /// request id) surfaces as [`DbError::UniqueViolation`] for the engine
    /// to resolve as an idempotency race.
    pub async fn insert_finalized(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
        debug!(bill_id = %bill.id, bill_number = %bill.bill_number, "inserting bill");

        let (approved_by, reason, token_id) = match &bill.override_approval {
            Some(approval) => (
                Some(approval.approved_by.as_str()),
                Some(approval.reason.as_str()),
                Some(approval.token_id.as_str()),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO bills (
                id, tenant_id, bill_number, client_request_id, fiscal_year, sequence,
                customer_name, customer_contact, status, payment_method, billing_date,
                subtotal_cents, discount_bps, discount_cents, taxable_cents,
                tax_bps, tax_cents, grand_total_cents,
                prescription_kind, prescription_ref, prescription_status, prescription_note,
                override_approved_by, override_reason, override_token_id,
                voided_at, void_reason, voided_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18,
                ?19, ?20, ?21, ?22,
                ?23, ?24, ?25,
                ?26, ?27, ?28, ?29
            )
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.tenant_id)
        .bind(&bill.bill_number)
        .bind(&bill.client_request_id)
        .bind(&bill.fiscal_year)
        .bind(bill.sequence)
        .bind(&bill.customer_name)
        .bind(&bill.customer_contact)
        .bind(bill.status)
        .bind(bill.payment_method)
        .bind(bill.billing_date)
        .bind(bill.subtotal_cents)
        .bind(bill.discount_bps)
        .bind(bill.discount_cents)
        .bind(bill.taxable_cents)
        .bind(bill.tax_bps)
        .bind(bill.tax_cents)
        .bind(bill.grand_total_cents)
        .bind(bill.prescription.kind())
        .bind(bill.prescription.reference())
        .bind(bill.prescription_status)
        .bind(&bill.prescription_note)
        .bind(approved_by)
        .bind(reason)
        .bind(token_id)
        .bind(bill.voided_at)
        .bind(&bill.void_reason)
        .bind(&bill.voided_by)
        .bind(bill.created_at)
        .execute(&mut *conn)
        .await?;

        for (line_no, item) in bill.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bill_items (
                    id, bill_id, line_no, medicine_id, medicine_name,
                    quantity, unit_rate_cents, unit_cost_cents,
                    line_total_cents, line_profit_cents, requires_override
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&item.id)
            .bind(&bill.id)
            .bind(line_no as i64)
            .bind(&item.medicine_id)
            .bind(&item.medicine_name)
            .bind(item.quantity)
            .bind(item.unit_rate_cents)
            .bind(item.unit_cost_cents)
            .bind(item.line_total_cents)
            .bind(item.line_profit_cents)
            .bind(item.requires_override)
            .execute(&mut *conn)
            .await?;

            for (position, alloc) in item.allocations.iter().enumerate() {
                let expired = alloc.expiry_date < bill.billing_date;
                sqlx::query(
                    r#"
                    INSERT INTO bill_item_allocations (
                        bill_item_id, position, lot_number, expiry_date, quantity, expired
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(&item.id)
                .bind(position as i64)
                .bind(&alloc.lot_number)
                .bind(alloc.expiry_date)
                .bind(alloc.quantity)
                .bind(expired)
                .execute(&mut *conn)
                .await?;
            }
        }

        Ok(())
    }

    /// Transitions a finalized bill to voided. Returns `false` when no
    /// finalized bill matched (missing, foreign tenant, or already
    /// voided) — the caller distinguishes those cases from its own read.
    pub async fn transition_to_voided(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        bill_id: &str,
        actor_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bills SET
                status = 'voided',
                voided_at = ?3,
                void_reason = ?4,
                voided_by = ?5
            WHERE id = ?1 AND tenant_id = ?2 AND status = 'finalized'
            "#,
        )
        .bind(bill_id)
        .bind(tenant_id)
        .bind(at)
        .bind(reason)
        .bind(actor_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finds a bill (with items and allocations) by primary id.
    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        bill_id: &str,
    ) -> DbResult<Option<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<BillRow> = sqlx::query_as(&sql)
            .bind(bill_id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(Self::assemble(conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Finds a bill by its external invoice number.
    pub async fn find_by_number(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        bill_number: &str,
    ) -> DbResult<Option<Bill>> {
        let sql =
            format!("SELECT {BILL_COLUMNS} FROM bills WHERE tenant_id = ?1 AND bill_number = ?2");
        let row: Option<BillRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(bill_number)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(Self::assemble(conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Finds a bill by the client idempotency key it was created under.
    pub async fn find_by_request_id(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        client_request_id: &str,
    ) -> DbResult<Option<Bill>> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE tenant_id = ?1 AND client_request_id = ?2"
        );
        let row: Option<BillRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(client_request_id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(Self::assemble(conn, row).await?)),
            None => Ok(None),
        }
    }

    /// Updates the prescription verification fields — part of the narrow
    /// mutable allow-list on a finalized bill.
    pub async fn update_prescription_status(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        bill_id: &str,
        status: PrescriptionStatus,
        note: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills SET prescription_status = ?3, prescription_note = ?4
            WHERE id = ?1 AND tenant_id = ?2 AND status = 'finalized'
            "#,
        )
        .bind(bill_id)
        .bind(tenant_id)
        .bind(status)
        .bind(note)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill (finalized)", bill_id));
        }
        Ok(())
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    async fn assemble(conn: &mut SqliteConnection, row: BillRow) -> DbResult<Bill> {
        let item_rows: Vec<BillItemRow> = sqlx::query_as(
            r#"
            SELECT id, medicine_id, medicine_name, quantity,
                   unit_rate_cents, unit_cost_cents,
                   line_total_cents, line_profit_cents, requires_override
            FROM bill_items
            WHERE bill_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(&row.id)
        .fetch_all(&mut *conn)
        .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        let mut expired_allocations = Vec::new();

        for item_row in item_rows {
            let alloc_rows: Vec<AllocationRow> = sqlx::query_as(
                r#"
                SELECT lot_number, expiry_date, quantity, expired
                FROM bill_item_allocations
                WHERE bill_item_id = ?1
                ORDER BY position
                "#,
            )
            .bind(&item_row.id)
            .fetch_all(&mut *conn)
            .await?;

            let mut allocations = Vec::with_capacity(alloc_rows.len());
            for alloc in alloc_rows {
                if alloc.expired {
                    expired_allocations.push(ExpiredAllocation {
                        medicine_id: item_row.medicine_id.clone(),
                        medicine_name: item_row.medicine_name.clone(),
                        lot_number: alloc.lot_number.clone(),
                        expiry_date: alloc.expiry_date,
                        quantity: alloc.quantity,
                    });
                }
                allocations.push(BatchAllocation {
                    lot_number: alloc.lot_number,
                    expiry_date: alloc.expiry_date,
                    quantity: alloc.quantity,
                });
            }

            items.push(BillItem {
                id: item_row.id,
                medicine_id: item_row.medicine_id,
                medicine_name: item_row.medicine_name,
                quantity: item_row.quantity,
                unit_rate_cents: item_row.unit_rate_cents,
                unit_cost_cents: item_row.unit_cost_cents,
                line_total_cents: item_row.line_total_cents,
                line_profit_cents: item_row.line_profit_cents,
                requires_override: item_row.requires_override,
                allocations,
            });
        }

        let override_approval = match (row.override_approved_by, row.override_reason, row.override_token_id)
        {
            (Some(approved_by), Some(reason), Some(token_id)) => Some(OverrideApproval {
                approved_by,
                reason,
                token_id,
                expired_allocations,
            }),
            _ => None,
        };

        Ok(Bill {
            id: row.id,
            tenant_id: row.tenant_id,
            bill_number: row.bill_number,
            client_request_id: row.client_request_id,
            fiscal_year: row.fiscal_year,
            sequence: row.sequence,
            customer_name: row.customer_name,
            customer_contact: row.customer_contact,
            status: row.status,
            payment_method: row.payment_method,
            billing_date: row.billing_date,
            subtotal_cents: row.subtotal_cents,
            discount_bps: row.discount_bps,
            discount_cents: row.discount_cents,
            taxable_cents: row.taxable_cents,
            tax_bps: row.tax_bps,
            tax_cents: row.tax_cents,
            grand_total_cents: row.grand_total_cents,
            items,
            prescription: Prescription::from_parts(&row.prescription_kind, row.prescription_ref),
            prescription_status: row.prescription_status,
            prescription_note: row.prescription_note,
            override_approval,
            voided_at: row.voided_at,
            void_reason: row.void_reason,
            voided_by: row.voided_by,
            created_at: row.created_at,
        })
    }

    // =========================================================================
    // Pool convenience wrappers
    // =========================================================================

    /// Loads a bill by id outside any transaction.
    pub async fn get_by_id(&self, tenant_id: &str, bill_id: &str) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_id(&mut conn, tenant_id, bill_id).await
    }

    /// Loads a bill by invoice number outside any transaction.
    pub async fn get_by_number(&self, tenant_id: &str, bill_number: &str) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_number(&mut conn, tenant_id, bill_number).await
    }

    /// Updates prescription verification outside any transaction.
    pub async fn set_prescription_status(
        &self,
        tenant_id: &str,
        bill_id: &str,
        status: PrescriptionStatus,
        note: Option<&str>,
    ) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::update_prescription_status(&mut conn, tenant_id, bill_id, status, note).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
