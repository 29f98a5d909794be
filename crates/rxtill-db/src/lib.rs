//! # rxtill-db: Storage Layer and Billing Engine for RxTill
//!
//! This crate provides database access and the transactional billing
//! orchestrator. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxTill Data Flow                                 │
//! │                                                                         │
//! │  Host handler (finalize request)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     rxtill-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ BillingEngine │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (engine.rs)  │    │ (catalog.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  bill.rs, …)  │    │              │  │   │
//! │  │   │ one txn per   │◄───│ tx-aware fns  │    │ 001_init.sql │  │   │
//! │  │   │ finalize/void │    │ + pool reads  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL, foreign keys, write-once triggers)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, bill, token, ...)
//! - [`engine`] - The transactional finalize/void/override orchestrator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rxtill_db::{BillingConfig, BillingEngine, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/rxtill.db")).await?;
//! let engine = BillingEngine::new(db, BillingConfig::default());
//!
//! let outcome = engine.finalize_bill("tenant-1", &cart).await?;
//! println!("{}", outcome.bill.bill_number); // IRD-2081-82-000007
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{BillingConfig, BillingEngine, FinalizeOutcome};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditRepository;
pub use repository::bill::BillRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::sequence::InvoiceSequenceRepository;
pub use repository::settings::TenantSettingsRepository;
pub use repository::token::OverrideTokenRepository;
