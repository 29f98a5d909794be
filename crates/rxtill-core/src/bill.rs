//! # Bill
//!
//! The immutable financial record produced by finalization.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bill Lifecycle                                   │
//! │                                                                         │
//! │  1. FINALIZE (only creation path)                                      │
//! │     └── Bill::new_finalized() → status: Finalized                      │
//! │         every line carries the exact batch allocations consumed        │
//! │                                                                         │
//! │  2. (OPTIONAL) PRESCRIPTION REVIEW                                     │
//! │     └── set_prescription_status() — allowed after finalization         │
//! │                                                                         │
//! │  3. (OPTIONAL) VOID                                                    │
//! │     └── mark_voided() → status: Voided (one-way, once)                 │
//! │                                                                         │
//! │  There is NO general-purpose update. Everything outside these          │
//! │  transitions is write-once; the storage layer backs this up with       │
//! │  triggers that abort any other UPDATE.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::batch::BatchAllocation;
use crate::error::{BillingError, BillingResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Prescription, PrescriptionStatus};

// =============================================================================
// Bill Status
// =============================================================================

/// The status of a bill. A bill is born `Finalized` and may transition to
/// `Voided` exactly once; it is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Finalized,
    Voided,
}

// =============================================================================
// Bill Item
// =============================================================================

/// A line item on a bill. Snapshot pattern: the medicine name, rate, and
/// cost are frozen at finalize time, and the exact batch allocations are
/// embedded so a void can restore them precisely.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillItem {
    pub id: String,
    pub medicine_id: String,
    /// Name at time of sale (frozen).
    pub medicine_name: String,
    pub quantity: i64,
    /// Unit rate in the smallest currency unit at time of sale (frozen).
    pub unit_rate_cents: i64,
    /// Unit cost at time of sale (frozen).
    pub unit_cost_cents: i64,
    /// quantity × unit rate.
    pub line_total_cents: i64,
    /// quantity × (unit rate − unit cost).
    pub line_profit_cents: i64,
    /// True when any allocation on this line was expired at billing time.
    pub requires_override: bool,
    /// The exact (lot, expiry, qty) slices consumed for this line.
    pub allocations: Vec<BatchAllocation>,
}

impl BillItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Override Approval
// =============================================================================

/// One expired allocation recorded in the override audit block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpiredAllocation {
    pub medicine_id: String,
    pub medicine_name: String,
    pub lot_number: String,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub quantity: i64,
}

/// Audit block attached to a bill that sold expired stock under an
/// override token. One approval covers the whole bill: the first expired
/// line redeems the token, later expired lines reuse the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverrideApproval {
    /// Identity of the token issuer (the approver).
    pub approved_by: String,
    /// Reason given when the token was issued.
    pub reason: String,
    /// Id of the redeemed token record.
    pub token_id: String,
    /// Every expired allocation on the bill, across all lines.
    pub expired_allocations: Vec<ExpiredAllocation>,
}

// =============================================================================
// Bill
// =============================================================================

/// A finalized (or voided) bill.
///
/// Construction happens only through [`Bill::new_finalized`]; the only
/// mutations are [`Bill::mark_voided`] and [`Bill::set_prescription_status`].
/// Everything else is write-once from the moment of creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bill {
    pub id: String,
    pub tenant_id: String,
    /// External invoice number, e.g. `IRD-2081-82-000007`.
    pub bill_number: String,
    /// Client idempotency key the bill was created under, if any.
    pub client_request_id: Option<String>,
    /// Fiscal-year label the sequence was drawn from.
    pub fiscal_year: String,
    /// Sequence within the fiscal year (0 for externally numbered bills
    /// whose number does not parse).
    pub sequence: i64,

    pub customer_name: String,
    pub customer_contact: Option<String>,

    pub status: BillStatus,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub billing_date: NaiveDate,

    pub subtotal_cents: i64,
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub taxable_cents: i64,
    pub tax_bps: u32,
    pub tax_cents: i64,
    pub grand_total_cents: i64,

    /// Ordered line items with embedded batch allocations.
    pub items: Vec<BillItem>,

    pub prescription: Prescription,
    pub prescription_status: PrescriptionStatus,
    pub prescription_note: Option<String>,

    /// Present when the bill sold expired stock under an override.
    pub override_approval: Option<OverrideApproval>,

    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Everything `new_finalized` needs beyond the priced amounts.
/// Kept as a struct so the orchestrator call site stays readable.
#[derive(Debug, Clone)]
pub struct BillDraft {
    pub tenant_id: String,
    pub bill_number: String,
    pub client_request_id: Option<String>,
    pub fiscal_year: String,
    pub sequence: i64,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub payment_method: PaymentMethod,
    pub billing_date: NaiveDate,
    pub discount_bps: u32,
    pub tax_bps: u32,
    pub prescription: Prescription,
}

impl Bill {
    /// The single creation path: assembles a finalized bill from a priced
    /// draft, its line items, and an optional override approval.
    #[allow(clippy::too_many_arguments)]
    pub fn new_finalized(
        draft: BillDraft,
        subtotal: Money,
        discount: Money,
        taxable: Money,
        tax: Money,
        grand_total: Money,
        items: Vec<BillItem>,
        override_approval: Option<OverrideApproval>,
    ) -> Self {
        Bill {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: draft.tenant_id,
            bill_number: draft.bill_number,
            client_request_id: draft.client_request_id,
            fiscal_year: draft.fiscal_year,
            sequence: draft.sequence,
            customer_name: draft.customer_name,
            customer_contact: draft.customer_contact,
            status: BillStatus::Finalized,
            payment_method: draft.payment_method,
            billing_date: draft.billing_date,
            subtotal_cents: subtotal.cents(),
            discount_bps: draft.discount_bps,
            discount_cents: discount.cents(),
            taxable_cents: taxable.cents(),
            tax_bps: draft.tax_bps,
            tax_cents: tax.cents(),
            grand_total_cents: grand_total.cents(),
            items,
            prescription: draft.prescription,
            prescription_status: PrescriptionStatus::Unverified,
            prescription_note: None,
            override_approval,
            voided_at: None,
            void_reason: None,
            voided_by: None,
            created_at: Utc::now(),
        }
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// The one-way transition to `Voided`. Rejects a second void.
    pub fn mark_voided(
        &mut self,
        actor_id: impl Into<String>,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> BillingResult<()> {
        if self.status == BillStatus::Voided {
            return Err(BillingError::BillAlreadyVoided {
                bill_number: self.bill_number.clone(),
            });
        }
        self.status = BillStatus::Voided;
        self.voided_at = Some(at);
        self.void_reason = Some(reason.into());
        self.voided_by = Some(actor_id.into());
        Ok(())
    }

    /// Updates the prescription verification state. Allowed on finalized
    /// bills; a voided bill is frozen entirely.
    pub fn set_prescription_status(
        &mut self,
        status: PrescriptionStatus,
        note: Option<String>,
    ) -> BillingResult<()> {
        if self.status == BillStatus::Voided {
            return Err(BillingError::BillAlreadyVoided {
                bill_number: self.bill_number.clone(),
            });
        }
        self.prescription_status = status;
        self.prescription_note = note;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_bill() -> Bill {
        let draft = BillDraft {
            tenant_id: "t1".into(),
            bill_number: "IRD-2081-82-000001".into(),
            client_request_id: Some("req-1".into()),
            fiscal_year: "2081-82".into(),
            sequence: 1,
            customer_name: "Walk-in".into(),
            customer_contact: None,
            payment_method: PaymentMethod::Cash,
            billing_date: date(2024, 12, 1),
            discount_bps: 1000,
            tax_bps: 1300,
            prescription: Prescription::None,
        };
        Bill::new_finalized(
            draft,
            Money::from_cents(40000),
            Money::from_cents(4000),
            Money::from_cents(36000),
            Money::from_cents(4680),
            Money::from_cents(40680),
            vec![],
            None,
        )
    }

    #[test]
    fn test_new_finalized_is_finalized() {
        let bill = sample_bill();
        assert_eq!(bill.status, BillStatus::Finalized);
        assert_eq!(bill.grand_total().cents(), 40680);
        assert_eq!(bill.prescription_status, PrescriptionStatus::Unverified);
        assert!(bill.voided_at.is_none());
    }

    #[test]
    fn test_mark_voided_once() {
        let mut bill = sample_bill();
        let at = Utc::now();
        bill.mark_voided("manager-1", "wrong customer", at).unwrap();
        assert_eq!(bill.status, BillStatus::Voided);
        assert_eq!(bill.voided_by.as_deref(), Some("manager-1"));
        assert_eq!(bill.voided_at, Some(at));

        let err = bill.mark_voided("manager-1", "again", Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::BillAlreadyVoided { .. }));
    }

    #[test]
    fn test_prescription_status_mutable_on_finalized() {
        let mut bill = sample_bill();
        bill.set_prescription_status(PrescriptionStatus::Verified, Some("checked".into()))
            .unwrap();
        assert_eq!(bill.prescription_status, PrescriptionStatus::Verified);
        assert_eq!(bill.prescription_note.as_deref(), Some("checked"));
    }

    #[test]
    fn test_prescription_status_frozen_on_voided() {
        let mut bill = sample_bill();
        bill.mark_voided("manager-1", "void", Utc::now()).unwrap();
        let err = bill
            .set_prescription_status(PrescriptionStatus::Verified, None)
            .unwrap_err();
        assert!(matches!(err, BillingError::BillAlreadyVoided { .. }));
    }
}
