//! # Domain Types
//!
//! Core domain types used throughout RxTill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │   │      Cart       │   │  LedgerEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  lines[]        │   │  bill_number    │       │
//! │  │  batches[]      │   │  prescription   │   │  kind           │       │
//! │  │  total_stock ★  │   │  override_token │   │  amount (±)     │       │
//! │  │  next_expiry ★  │   │  request id     │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │   ★ = derived from batches[], recomputed on every save                 │
//! │                                                                         │
//! │  (`Bill` and friends live in the `bill` module, batches in `batch`.)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (bill number, lot number) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::batch::{summarize, Batch};
use crate::money::Money;

// =============================================================================
// Regulatory Class
// =============================================================================

/// Regulatory classification of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryClass {
    /// Over-the-counter; sellable without restriction.
    Otc,
    /// Dispensed only against a prescription record.
    PrescriptionOnly,
    /// Scheduled/controlled substance (also prescription-gated).
    Controlled,
}

impl Default for RegulatoryClass {
    fn default() -> Self {
        RegulatoryClass::Otc
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A catalog item with its batch list.
///
/// `total_stock`, `next_expiry`, and `next_expiry_lot` are a pure function
/// of `batches` — call [`Medicine::recompute_summary`] after any batch
/// mutation; the storage layer does so on every save.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Medicine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this medicine belongs to.
    pub tenant_id: String,

    /// Display name shown to the cashier and on the bill.
    pub name: String,

    /// Generic (INN) name, if tracked.
    pub generic_name: Option<String>,

    /// Selling price per unit in the smallest currency unit.
    pub unit_price_cents: i64,

    /// Cost per unit, for line profit calculations.
    pub unit_cost_cents: i64,

    /// Stock level at which a reorder is suggested.
    pub reorder_threshold: i64,

    /// Whether a sale of this medicine requires a prescription record.
    pub prescription_required: bool,

    /// Regulatory classification.
    pub regulatory_class: RegulatoryClass,

    /// Expiry-dated lots. Owned exclusively by this medicine.
    pub batches: Vec<Batch>,

    /// Derived: total units across live batches.
    pub total_stock: i64,

    /// Derived: soonest expiry among live batches.
    #[ts(as = "Option<String>")]
    pub next_expiry: Option<NaiveDate>,

    /// Derived: lot holding the soonest expiry.
    pub next_expiry_lot: Option<String>,

    /// Whether the medicine is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the unit selling price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Overwrites the derived summary fields from the batch list.
    pub fn recompute_summary(&mut self) {
        let summary = summarize(&self.batches);
        self.total_stock = summary.total_quantity;
        self.next_expiry = summary.next_expiry;
        self.next_expiry_lot = summary.next_expiry_lot;
    }

    /// Stock is low when at or below the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.total_stock <= self.reorder_threshold
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// QR / wallet payment.
    MobileWallet,
    /// Customer account, settled later.
    Credit,
}

// =============================================================================
// Prescription
// =============================================================================

/// Prescription evidence attached to a cart or bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prescription {
    /// No prescription. Valid only when the cart carries no
    /// prescription-required medicines.
    None,
    /// Scanned/photographed prescription, referenced by storage key.
    Image { reference: String },
    /// Transcribed prescription text.
    DigitalText { text: String },
}

impl Prescription {
    /// True when no evidence is attached.
    pub fn is_none(&self) -> bool {
        matches!(self, Prescription::None)
    }

    /// Storage discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            Prescription::None => "none",
            Prescription::Image { .. } => "image",
            Prescription::DigitalText { .. } => "digital_text",
        }
    }

    /// Storage payload (image reference or digital text).
    pub fn reference(&self) -> Option<&str> {
        match self {
            Prescription::None => None,
            Prescription::Image { reference } => Some(reference),
            Prescription::DigitalText { text } => Some(text),
        }
    }

    /// Rebuilds from the storage discriminant + payload.
    pub fn from_parts(kind: &str, reference: Option<String>) -> Self {
        match (kind, reference) {
            ("image", Some(reference)) => Prescription::Image { reference },
            ("digital_text", Some(text)) => Prescription::DigitalText { text },
            _ => Prescription::None,
        }
    }
}

impl Default for Prescription {
    fn default() -> Self {
        Prescription::None
    }
}

/// Verification workflow state of a bill's prescription. One of the few
/// fields that stays mutable after finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    /// Attached but not yet reviewed by a pharmacist.
    Unverified,
    Verified,
    Rejected,
}

impl Default for PrescriptionStatus {
    fn default() -> Self {
        PrescriptionStatus::Unverified
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One requested line: which medicine, how many, at what rate.
///
/// The rate is captured from the till rather than re-read from the catalog
/// so that an in-flight price change cannot silently reprice a cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub medicine_id: String,
    pub quantity: i64,
    pub unit_rate_cents: i64,
}

/// A point-of-sale cart submitted for finalization.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    /// Client-generated idempotency key. A retried submission with the
    /// same key replays the committed bill instead of re-executing.
    pub client_request_id: Option<String>,

    /// Externally supplied invoice number. When present, sequence
    /// allocation is skipped and only global uniqueness is checked.
    pub bill_number: Option<String>,

    pub customer_name: String,
    pub customer_contact: Option<String>,

    /// Date the sale is recorded under; drives the fiscal-year label and
    /// the expired-stock judgment.
    #[ts(as = "String")]
    pub billing_date: NaiveDate,

    pub payment_method: PaymentMethod,

    /// Whole-cart discount in basis points (1000 = 10%).
    pub discount_bps: u32,

    pub lines: Vec<CartLine>,

    pub prescription: Prescription,

    /// Single-use token authorizing sale of expired stock, if any line
    /// will consume an expired batch.
    pub override_token: Option<String>,

    /// Cashier submitting the cart; recorded in the audit trail.
    pub cashier_id: String,
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// Direction of a revenue ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Revenue mirrored from a finalized bill.
    Sale,
    /// Reversal mirrored from a voided bill (opposite sign, equal
    /// magnitude).
    VoidReversal,
}

/// One revenue ledger entry. Written in the same transaction as the bill
/// it mirrors.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub tenant_id: String,
    pub bill_number: String,
    pub kind: LedgerEntryKind,
    /// Signed amount: positive for sales, negative for reversals.
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub entry_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Audit Entry
// =============================================================================

/// Outcome recorded on an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// An append-only audit record. Written for every finalize, void,
/// override issue, and stock mutation; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditEntry {
    pub id: String,
    pub tenant_id: String,
    /// Who acted (cashier, approver, system job).
    pub actor: String,
    /// Dotted action name, e.g. `bill.finalize`.
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub status: AuditStatus,
    /// Structured detail as a JSON document.
    pub detail: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Builds an entry stamped now.
    pub fn new(
        tenant_id: impl Into<String>,
        actor: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        status: AuditStatus,
        detail: Option<String>,
    ) -> Self {
        AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            actor: actor.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            status,
            detail,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Override Token Records
// =============================================================================

/// Stored override-token record. Only the hash of the token is persisted;
/// the plaintext is returned once at issue time and never retrievable.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverrideTokenRecord {
    pub id: String,
    pub tenant_id: String,
    pub token_hash: String,
    pub issued_by: String,
    pub reason: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<String>,
    pub used_for_bill: Option<String>,
}

/// What `issue_override_token` hands back to the approver — the only time
/// the plaintext exists outside the caller's hands.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct IssuedOverrideToken {
    pub token_id: String,
    pub plaintext: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn medicine_with_batches(batches: Vec<Batch>) -> Medicine {
        let now = Utc::now();
        Medicine {
            id: "m1".into(),
            tenant_id: "t1".into(),
            name: "Paracetamol 500mg".into(),
            generic_name: Some("paracetamol".into()),
            unit_price_cents: 1000,
            unit_cost_cents: 600,
            reorder_threshold: 10,
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

    #[test]
    fn test_recompute_summary_tracks_batches() {
        let mut med = medicine_with_batches(vec![
            Batch::new("a", date(2025, 1, 1), 5),
            Batch::new("b", date(2025, 6, 1), 10),
        ]);
        med.recompute_summary();
        assert_eq!(med.total_stock, 15);
        assert_eq!(med.next_expiry, Some(date(2025, 1, 1)));
        assert_eq!(med.next_expiry_lot.as_deref(), Some("a"));

        med.batches[0].quantity = 0;
        med.recompute_summary();
        assert_eq!(med.total_stock, 10);
        assert_eq!(med.next_expiry, Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_needs_reorder() {
        let mut med = medicine_with_batches(vec![Batch::new("a", date(2025, 1, 1), 5)]);
        med.recompute_summary();
        assert!(med.needs_reorder()); // 5 <= threshold 10

        med.batches.push(Batch::new("b", date(2025, 6, 1), 50));
        med.recompute_summary();
        assert!(!med.needs_reorder());
    }

    #[test]
    fn test_prescription_parts_round_trip() {
        let cases = [
            Prescription::None,
            Prescription::Image { reference: "s3://rx/123.jpg".into() },
            Prescription::DigitalText { text: "Amoxicillin 500mg TID x7d".into() },
        ];
        for p in cases {
            let rebuilt =
                Prescription::from_parts(p.kind(), p.reference().map(|s| s.to_string()));
            assert_eq!(rebuilt, p);
        }
    }

    #[test]
    fn test_prescription_serde_tagging() {
        let p = Prescription::Image { reference: "ref-1".into() };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"image\""));
        let back: Prescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_ledger_amount_sign() {
        let entry = LedgerEntry {
            id: "l1".into(),
            tenant_id: "t1".into(),
            bill_number: "IRD-2081-82-000001".into(),
            kind: LedgerEntryKind::VoidReversal,
            amount_cents: -40680,
            entry_date: date(2024, 12, 1),
            created_at: Utc::now(),
        };
        assert!(entry.amount().is_negative());
    }
}
