//! # Override Token Repository
//!
//! Single-use credentials authorizing sale of expired stock.
//!
//! ## Token Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Override Token Lifecycle                             │
//! │                                                                         │
//! │  1. ISSUE (approver)                                                   │
//! │     └── 32 random bytes → base64 plaintext, returned ONCE             │
//! │         SHA-256 digest stored; plaintext never persisted              │
//! │         TTL clamped to 1–30 minutes                                   │
//! │                                                                         │
//! │  2. REDEEM (finalize transaction)                                      │
//! │     └── one atomic UPDATE ... WHERE used_at IS NULL                   │
//! │                              AND expires_at > now                     │
//! │         RETURNING issuer/reason for the bill's audit block            │
//! │         wrong, reused, and expired tokens all miss identically        │
//! │                                                                         │
//! │  3. EXPIRE                                                             │
//! │     └── purge_expired() deletes stale unredeemed rows                 │
//! │         (runs opportunistically on every issue)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use rxtill_core::types::IssuedOverrideToken;
use rxtill_core::{MAX_OVERRIDE_TTL_MINUTES, MIN_OVERRIDE_TTL_MINUTES};

/// Repository for override token operations.
#[derive(Debug, Clone)]
pub struct OverrideTokenRepository {
    pool: SqlitePool,
}

/// What a successful redemption returns: the issuer identity and reason,
/// attached to the bill's override audit block.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RedeemedOverride {
    pub id: String,
    pub issued_by: String,
    pub reason: String,
}

/// One-way hash of a token plaintext (URL-safe base64 of the SHA-256
/// digest).
fn hash_token(plaintext: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(plaintext.as_bytes()))
}

impl OverrideTokenRepository {
    /// Creates a new OverrideTokenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OverrideTokenRepository { pool }
    }

    // =========================================================================
    // Transaction-participating operations
    // =========================================================================

    /// Issues a new token: persists the hash plus issuer/reason/expiry and
    /// returns the plaintext exactly once. The TTL is clamped to
    /// [`MIN_OVERRIDE_TTL_MINUTES`]..=[`MAX_OVERRIDE_TTL_MINUTES`].
    pub async fn issue(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        issued_by: &str,
        reason: &str,
        ttl_minutes: i64,
    ) -> DbResult<IssuedOverrideToken> {
        // Opportunistic TTL cleanup; a dedicated sweeper is not required.
        Self::purge_expired(conn, Utc::now()).await?;

        let ttl = ttl_minutes.clamp(MIN_OVERRIDE_TTL_MINUTES, MAX_OVERRIDE_TTL_MINUTES);

        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let plaintext = URL_SAFE_NO_PAD.encode(bytes);

        let token_id = Uuid::new_v4().to_string();
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(ttl);

        sqlx::query(
            r#"
            INSERT INTO override_tokens (
                id, tenant_id, token_hash, issued_by, reason, issued_at, expires_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&token_id)
        .bind(tenant_id)
        .bind(hash_token(&plaintext))
        .bind(issued_by)
        .bind(reason)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&mut *conn)
        .await?;

        debug!(token_id = %token_id, ttl_minutes = ttl, "override token issued");

        Ok(IssuedOverrideToken {
            token_id,
            plaintext,
            expires_at,
        })
    }

    /// Redeems a token: atomically marks an unused, unexpired record as
    /// used and returns the issuer identity. Returns `None` when the token
    /// is wrong, already used, or expired — the caller maps that to its
    /// invalid-token error.
    pub async fn redeem(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        plaintext: &str,
        used_by: &str,
        used_for_bill: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<RedeemedOverride>> {
        let redeemed: Option<RedeemedOverride> = sqlx::query_as(
            r#"
            UPDATE override_tokens
            SET used_at = ?1, used_by = ?2, used_for_bill = ?3
            WHERE tenant_id = ?4
              AND token_hash = ?5
              AND used_at IS NULL
              AND expires_at > ?1
            RETURNING id, issued_by, reason
            "#,
        )
        .bind(now)
        .bind(used_by)
        .bind(used_for_bill)
        .bind(tenant_id)
        .bind(hash_token(plaintext))
        .fetch_optional(&mut *conn)
        .await?;

        Ok(redeemed)
    }

    /// Deletes unredeemed tokens whose expiry has passed. Redeemed rows
    /// are kept: they are referenced from bills.
    pub async fn purge_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM override_tokens WHERE used_at IS NULL AND expires_at <= ?1")
                .bind(now)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Pool convenience wrappers
    // =========================================================================

    /// Issues a token outside any transaction.
    pub async fn issue_standalone(
        &self,
        tenant_id: &str,
        issued_by: &str,
        reason: &str,
        ttl_minutes: i64,
    ) -> DbResult<IssuedOverrideToken> {
        let mut conn = self.pool.acquire().await?;
        Self::issue(&mut conn, tenant_id, issued_by, reason, ttl_minutes).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_issue_returns_plaintext_once_and_stores_hash() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let issued = db
            .tokens()
            .issue_standalone("t1", "pharmacist-1", "short-dated clearance", 10)
            .await
            .unwrap();

        assert!(!issued.plaintext.is_empty());
        assert!(issued.expires_at > Utc::now());

        // Plaintext never hits storage.
        let stored: String = sqlx::query_scalar("SELECT token_hash FROM override_tokens WHERE id = ?1")
            .bind(&issued.token_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_ne!(stored, issued.plaintext);
        assert_eq!(stored, hash_token(&issued.plaintext));
    }

    #[tokio::test]
    async fn test_redeem_is_single_use() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let issued = db
            .tokens()
            .issue_standalone("t1", "pharmacist-1", "clearance", 10)
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let first = OverrideTokenRepository::redeem(
            &mut conn,
            "t1",
            &issued.plaintext,
            "cashier-1",
            "IRD-2081-82-000001",
            Utc::now(),
        )
        .await
        .unwrap();
        let first = first.unwrap();
        assert_eq!(first.issued_by, "pharmacist-1");
        assert_eq!(first.id, issued.token_id);

        // Second redemption misses.
        let second = OverrideTokenRepository::redeem(
            &mut conn,
            "t1",
            &issued.plaintext,
            "cashier-2",
            "IRD-2081-82-000002",
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_redeem_rejects_wrong_tenant_and_garbage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let issued = db
            .tokens()
            .issue_standalone("t1", "pharmacist-1", "clearance", 10)
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let wrong_tenant = OverrideTokenRepository::redeem(
            &mut conn, "t2", &issued.plaintext, "c", "b", Utc::now(),
        )
        .await
        .unwrap();
        assert!(wrong_tenant.is_none());

        let garbage =
            OverrideTokenRepository::redeem(&mut conn, "t1", "not-a-token", "c", "b", Utc::now())
                .await
                .unwrap();
        assert!(garbage.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_misses_and_gets_purged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Insert a token whose expiry is already in the past.
        let past = Utc::now() - Duration::minutes(5);
        sqlx::query(
            r#"
            INSERT INTO override_tokens (id, tenant_id, token_hash, issued_by, reason, issued_at, expires_at)
            VALUES ('tok-old', 't1', ?1, 'pharmacist-1', 'stale', ?2, ?3)
            "#,
        )
        .bind(hash_token("stale-token"))
        .bind(past - Duration::minutes(10))
        .bind(past)
        .execute(db.pool())
        .await
        .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let miss =
            OverrideTokenRepository::redeem(&mut conn, "t1", "stale-token", "c", "b", Utc::now())
                .await
                .unwrap();
        assert!(miss.is_none());

        let purged = OverrideTokenRepository::purge_expired(&mut conn, Utc::now())
            .await
            .unwrap();
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn test_ttl_is_clamped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let issued = db
            .tokens()
            .issue_standalone("t1", "p", "r", 500)
            .await
            .unwrap();
        let max = Utc::now() + Duration::minutes(MAX_OVERRIDE_TTL_MINUTES + 1);
        assert!(issued.expires_at < max);

        let issued = db.tokens().issue_standalone("t1", "p", "r", 0).await.unwrap();
        assert!(issued.expires_at > Utc::now());
    }
}
