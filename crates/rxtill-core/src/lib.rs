//! # rxtill-core: Pure Business Logic for RxTill
//!
//! This crate is the **heart** of the RxTill billing engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxTill Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Host Application (out of scope)                 │   │
//! │  │    HTTP routing ──► auth ──► tenant resolution ──► handlers    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 rxtill-db (BillingEngine)                       │   │
//! │  │    finalize_bill, void_bill, issue_override_token              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rxtill-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   batch   │  │   money   │  │  pricing  │  │  fiscal   │  │   │
//! │  │   │   FEFO    │  │   cents   │  │  totals   │  │  labels   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`batch`] - Batch Inventory Ledger: FEFO consume, restore, summarize
//! - [`bill`] - The write-once `Bill` record and its two sanctioned transitions
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Cart totals: subtotal, discount, VAT, grand total
//! - [`fiscal`] - Fiscal-year labels and invoice number format/parse
//! - [`error`] - The billing error taxonomy
//! - [`validation`] - Cart and input validation
//! - [`types`] - Remaining domain types (Medicine, Cart, ledger, audit, ...)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod bill;
pub mod error;
pub mod fiscal;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use batch::{Batch, BatchAllocation, StockSummary};
pub use bill::{Bill, BillItem, BillStatus, ExpiredAllocation, OverrideApproval};
pub use error::{BillingError, BillingResult, ValidationError};
pub use fiscal::{FiscalYearRule, InvoiceNumber};
pub use money::{Money, Percent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default VAT rate in basis points (13%), applied when a tenant has no
/// configured override.
pub const DEFAULT_VAT_BPS: u32 = 1300;

/// Default invoice number prefix. Part of the durable external contract:
/// numbers read `IRD-2081-82-000007`.
pub const DEFAULT_INVOICE_PREFIX: &str = "IRD";

/// Width of the zero-padded sequence in an invoice number.
pub const INVOICE_SEQUENCE_WIDTH: usize = 6;

/// Maximum line items allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Override tokens live at least this long.
pub const MIN_OVERRIDE_TTL_MINUTES: i64 = 1;

/// Override tokens live at most this long. The clamp bounds the exposure
/// window of an unredeemed token.
pub const MAX_OVERRIDE_TTL_MINUTES: i64 = 30;
