//! # Invoice Sequence Repository
//!
//! The per-(tenant, fiscal year) monotonic counter behind invoice numbers.
//!
//! The only mutation is a single atomic upsert-returning statement: the
//! counter is created at 1 when absent, otherwise incremented, and the new
//! value is read back in the same statement. There is no read-then-write
//! anywhere, so two concurrent allocations can never observe the same
//! value. Gaps (from aborted finalize transactions) are acceptable;
//! duplicates are not.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Repository for invoice sequence counters.
#[derive(Debug, Clone)]
pub struct InvoiceSequenceRepository {
    pool: SqlitePool,
}

impl InvoiceSequenceRepository {
    /// Creates a new InvoiceSequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceSequenceRepository { pool }
    }

    /// Atomically increments and returns the next sequence value for
    /// (tenant, fiscal year), creating the counter on first use.
    pub async fn next(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        fiscal_year: &str,
    ) -> DbResult<i64> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_counters (tenant_id, fiscal_year, seq)
            VALUES (?1, ?2, 1)
            ON CONFLICT(tenant_id, fiscal_year) DO UPDATE SET seq = seq + 1
            RETURNING seq
            "#,
        )
        .bind(tenant_id)
        .bind(fiscal_year)
        .fetch_one(&mut *conn)
        .await?;

        debug!(tenant_id, fiscal_year, seq, "allocated invoice sequence");
        Ok(seq)
    }

    /// Allocates outside any transaction (the caller's number is final
    /// regardless of what happens next; use [`Self::next`] inside the
    /// finalize transaction instead when the number must roll back).
    pub async fn allocate(&self, tenant_id: &str, fiscal_year: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::next(&mut conn, tenant_id, fiscal_year).await
    }

    /// Reads the current counter value without incrementing (diagnostics).
    pub async fn current(&self, tenant_id: &str, fiscal_year: &str) -> DbResult<i64> {
        let seq: Option<i64> = sqlx::query_scalar(
            "SELECT seq FROM invoice_counters WHERE tenant_id = ?1 AND fiscal_year = ?2",
        )
        .bind(tenant_id)
        .bind(fiscal_year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(seq.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
