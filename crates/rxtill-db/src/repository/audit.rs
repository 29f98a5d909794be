//! # Audit Log Repository
//!
//! Append-only trail of who did what to which entity, with structured
//! JSON detail. Written best-effort *outside* the billing transactions: a
//! failed audit write is logged and swallowed, never propagated to the
//! caller. Immutability is enforced by triggers — there is no update or
//! delete path here or anywhere else.

use sqlx::SqlitePool;

use crate::error::DbResult;
use rxtill_core::types::{AuditEntry, AuditStatus};

/// Repository for the append-only audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: String,
    tenant_id: String,
    actor: String,
    action: String,
    entity_type: String,
    entity_id: String,
    status: AuditStatus,
    detail: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            actor: row.actor,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            status: row.status,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends one audit entry.
    pub async fn append(&self, entry: &AuditEntry) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, tenant_id, actor, action, entity_type, entity_id, status, detail, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.status)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Entries for one entity, newest first.
    pub async fn for_entity(
        &self,
        tenant_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> DbResult<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, actor, action, entity_type, entity_id, status, detail, created_at
            FROM audit_log
            WHERE tenant_id = ?1 AND entity_type = ?2 AND entity_id = ?3
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }

    /// Entries for one action, newest first, bounded.
    pub async fn for_action(
        &self,
        tenant_id: &str,
        action: &str,
        limit: i64,
    ) -> DbResult<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, actor, action, entity_type, entity_id, status, detail, created_at
            FROM audit_log
            WHERE tenant_id = ?1 AND action = ?2
            ORDER BY created_at DESC
            LIMIT ?3
            "#,
        )
        .bind(tenant_id)
        .bind(action)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
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

    fn sample_entry() -> AuditEntry {
        AuditEntry::new(
            "t1",
            "cashier-1",
            "bill.finalize",
            "bill",
            "IRD-2081-82-000001",
            AuditStatus::Success,
            Some(r#"{"grand_total_cents":40680}"#.to_string()),
        )
    }

    #[tokio::test]
    async fn test_append_and_query() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let entry = sample_entry();
        db.audit().append(&entry).await.unwrap();

        let found = db
            .audit()
            .for_entity("t1", "bill", "IRD-2081-82-000001")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].actor, "cashier-1");
        assert_eq!(found[0].status, AuditStatus::Success);

        let by_action = db.audit().for_action("t1", "bill.finalize", 10).await.unwrap();
        assert_eq!(by_action.len(), 1);
    }

    #[tokio::test]
    async fn test_audit_entries_are_immutable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let entry = sample_entry();
        db.audit().append(&entry).await.unwrap();

        let err = sqlx::query("UPDATE audit_log SET actor = 'tampered' WHERE id = ?1")
            .bind(&entry.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::WriteOnceViolation { .. }));

        let err = sqlx::query("DELETE FROM audit_log WHERE id = ?1")
            .bind(&entry.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::WriteOnceViolation { .. }));
    }
}
