//! # Tenant Settings Repository
//!
//! Per-tenant configuration consumed by the billing engine. Currently the
//! only setting is the VAT rate override; a tenant without one uses the
//! engine's configured default.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use rxtill_core::money::Percent;

/// Repository for tenant settings.
#[derive(Debug, Clone)]
pub struct TenantSettingsRepository {
    pool: SqlitePool,
}

impl TenantSettingsRepository {
    /// Creates a new TenantSettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TenantSettingsRepository { pool }
    }

    /// Resolves the VAT rate for a tenant: the configured override when
    /// one exists, otherwise `default_rate`.
    pub async fn effective_vat_rate(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        default_rate: Percent,
    ) -> DbResult<Percent> {
        let bps: Option<Option<u32>> =
            sqlx::query_scalar("SELECT vat_bps FROM tenant_settings WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(bps
            .flatten()
            .map(Percent::from_bps)
            .unwrap_or(default_rate))
    }

    /// Sets (or clears) a tenant's VAT override.
    pub async fn set_vat_rate(&self, tenant_id: &str, rate: Option<Percent>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenant_settings (tenant_id, vat_bps) VALUES (?1, ?2)
            ON CONFLICT(tenant_id) DO UPDATE SET vat_bps = excluded.vat_bps
            "#,
        )
        .bind(tenant_id)
        .bind(rate.map(|r| r.bps()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use rxtill_core::DEFAULT_VAT_BPS;

    #[tokio::test]
    async fn test_falls_back_to_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let rate = TenantSettingsRepository::effective_vat_rate(
            &mut conn,
            "t1",
            Percent::from_bps(DEFAULT_VAT_BPS),
        )
        .await
        .unwrap();
        assert_eq!(rate.bps(), DEFAULT_VAT_BPS);
    }

    #[tokio::test]
    async fn test_override_and_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings()
            .set_vat_rate("t1", Some(Percent::from_bps(500)))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let rate = TenantSettingsRepository::effective_vat_rate(
            &mut conn,
            "t1",
            Percent::from_bps(DEFAULT_VAT_BPS),
        )
        .await
        .unwrap();
        assert_eq!(rate.bps(), 500);
        drop(conn);

        // Clearing the override restores the default.
        db.settings().set_vat_rate("t1", None).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let rate = TenantSettingsRepository::effective_vat_rate(
            &mut conn,
            "t1",
            Percent::from_bps(DEFAULT_VAT_BPS),
        )
        .await
        .unwrap();
        assert_eq!(rate.bps(), DEFAULT_VAT_BPS);
    }
}
