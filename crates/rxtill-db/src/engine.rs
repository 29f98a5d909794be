//! # Billing Engine
//!
//! The transactional core: cart in, numbered immutable bill out, with
//! batch stock debited, regulatory gates enforced, and the mirror-image
//! void path.
//!
//! ## Finalize State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One finalize attempt                                │
//! │                                                                         │
//! │  Validating                                                            │
//! │      │                                                                  │
//! │      ├── matching request id / bill number? ──► IdempotentReplay       │
//! │      ▼                                                                  │
//! │  Pricing (integer cents, per-step rounding)                            │
//! │      ▼                                                                  │
//! │  AllocatingSequence (skipped for caller-supplied numbers)              │
//! │      ▼                                                                  │
//! │  ConsumingBatches (FEFO per line, accumulated per medicine)            │
//! │      ▼                                                                  │
//! │  [RedeemingOverride] (at most once per bill)                           │
//! │      ▼                                                                  │
//! │  Persisting (medicines + bill graph + ledger entry)                    │
//! │      ▼                                                                  │
//! │  Committed ──► best-effort audit                                       │
//! │                                                                         │
//! │  Any failure → Aborted: the transaction rolls back as one unit,        │
//! │  a failure audit entry is still attempted.                             │
//! │                                                                         │
//! │  Unique violation at persist time = someone else already created       │
//! │  the bill: re-read and return the winner instead of erroring.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No in-process locking anywhere: correctness under concurrency comes
//! from the storage transaction plus the unique indexes.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::audit::AuditRepository;
use crate::repository::bill::BillRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::sequence::InvoiceSequenceRepository;
use crate::repository::settings::TenantSettingsRepository;
use crate::repository::token::{OverrideTokenRepository, RedeemedOverride};

use rxtill_core::batch::consume_fefo;
use rxtill_core::bill::{Bill, BillDraft, BillItem, ExpiredAllocation, OverrideApproval};
use rxtill_core::error::{BillingError, BillingResult, ValidationError};
use rxtill_core::fiscal::{FiscalYearRule, InvoiceNumber};
use rxtill_core::money::{Money, Percent};
use rxtill_core::pricing;
use rxtill_core::types::{
    AuditEntry, AuditStatus, Cart, IssuedOverrideToken, LedgerEntry, LedgerEntryKind, Medicine,
    PrescriptionStatus,
};
use rxtill_core::validation;
use rxtill_core::{DEFAULT_INVOICE_PREFIX, DEFAULT_VAT_BPS};

// =============================================================================
// Configuration
// =============================================================================

/// Engine configuration. All jurisdiction-specific behavior lives here as
/// data.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Prefix on every generated invoice number.
    pub invoice_prefix: String,
    /// Fiscal-year cutover rule driving the number's year label.
    pub fiscal_year: FiscalYearRule,
    /// VAT applied when a tenant has no configured override.
    pub default_vat: Percent,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            invoice_prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            fiscal_year: FiscalYearRule::default(),
            default_vat: Percent::from_bps(DEFAULT_VAT_BPS),
        }
    }
}

/// Result of a finalize call.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub bill: Bill,
    /// The mirrored revenue entry. Present on fresh commits; looked up on
    /// idempotent replays.
    pub ledger_entry: Option<LedgerEntry>,
    /// True when an existing bill was returned without side effects.
    pub idempotent: bool,
}

// =============================================================================
// Billing Engine
// =============================================================================

/// The billing finalization and void orchestrator.
#[derive(Debug, Clone)]
pub struct BillingEngine {
    db: Database,
    config: BillingConfig,
}

fn db_err(err: sqlx::Error) -> BillingError {
    BillingError::from(DbError::from(err))
}

impl BillingEngine {
    /// Creates an engine over a database handle.
    pub fn new(db: Database, config: BillingConfig) -> Self {
        BillingEngine { db, config }
    }

    /// The underlying database handle (read paths, tests).
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Finalize
    // =========================================================================

    /// Finalizes a cart into a numbered, immutable bill.
    ///
    /// Idempotent on `cart.client_request_id` and on a caller-supplied
    /// `cart.bill_number`: a match returns the committed bill with
    /// `idempotent: true` and no side effects, both on the optimistic
    /// pre-check and as the race fallback when the commit loses a
    /// duplicate-key race.
    pub async fn finalize_bill(&self, tenant_id: &str, cart: &Cart) -> BillingResult<FinalizeOutcome> {
        validation::validate_cart(cart)?;

        // Optimistic idempotent replay, before opening the transaction.
        if let Some(existing) = self.find_existing(tenant_id, cart).await? {
            debug!(bill_number = %existing.bill_number, "idempotent replay (pre-check)");
            return self.replay(tenant_id, existing).await;
        }

        match self.try_finalize(tenant_id, cart).await {
            Ok((bill, entry)) => {
                info!(
                    tenant_id,
                    bill_number = %bill.bill_number,
                    grand_total = %bill.grand_total(),
                    lines = bill.items.len(),
                    "bill finalized"
                );
                self.audit_finalize_success(tenant_id, cart, &bill).await;
                Ok(FinalizeOutcome {
                    bill,
                    ledger_entry: Some(entry),
                    idempotent: false,
                })
            }
            // Duplicate key at persist time: someone else committed first.
            Err(BillingError::DuplicateInvoiceNumber { bill_number }) => {
                if let Some(existing) = self.find_existing(tenant_id, cart).await? {
                    debug!(bill_number = %existing.bill_number, "idempotent replay (race fallback)");
                    return self.replay(tenant_id, existing).await;
                }
                let err = BillingError::DuplicateInvoiceNumber { bill_number };
                self.audit_finalize_failure(tenant_id, cart, &err).await;
                Err(err)
            }
            Err(err) => {
                warn!(tenant_id, code = err.code(), error = %err, "finalize aborted");
                self.audit_finalize_failure(tenant_id, cart, &err).await;
                Err(err)
            }
        }
    }

    /// The transactional body of a finalize attempt. Every mutation in
    /// here commits or rolls back as one unit; dropping the transaction
    /// on any early return is the rollback.
    async fn try_finalize(&self, tenant_id: &str, cart: &Cart) -> BillingResult<(Bill, LedgerEntry)> {
        let mut tx = self.db.pool().begin().await.map_err(db_err)?;

        let vat =
            TenantSettingsRepository::effective_vat_rate(&mut tx, tenant_id, self.config.default_vat)
                .await?;
        let discount = Percent::from_bps(cart.discount_bps);
        let totals = pricing::price(&cart.lines, discount, vat);

        // Invoice number: caller-supplied, or drawn from the per-(tenant,
        // fiscal year) counter. The counter increment rides inside this
        // transaction, so an abort leaves no trace.
        let (bill_number, fiscal_year, sequence) = match &cart.bill_number {
            Some(number) => match InvoiceNumber::parse(number) {
                Ok(parsed) => (number.clone(), parsed.fiscal_year, parsed.sequence),
                Err(_) => (
                    number.clone(),
                    self.config.fiscal_year.label(cart.billing_date),
                    0,
                ),
            },
            None => {
                let label = self.config.fiscal_year.label(cart.billing_date);
                let seq = InvoiceSequenceRepository::next(&mut tx, tenant_id, &label).await?;
                (
                    InvoiceNumber::format(&self.config.invoice_prefix, &label, seq),
                    label,
                    seq,
                )
            }
        };

        // Working set: one in-memory Medicine per id, surviving repeated
        // references from later lines so a cart naming the same medicine
        // twice consumes from already-debited state.
        let mut working: HashMap<String, Medicine> = HashMap::new();
        let mut line_order: Vec<String> = Vec::new();
        let mut items: Vec<BillItem> = Vec::new();
        let mut expired_allocations: Vec<ExpiredAllocation> = Vec::new();
        let mut redeemed: Option<RedeemedOverride> = None;
        let mut rx_required: Vec<String> = Vec::new();

        for line in &cart.lines {
            if !working.contains_key(&line.medicine_id) {
                let fetched =
                    CatalogRepository::find_for_tenant(&mut tx, &line.medicine_id, tenant_id)
                        .await?
                        .ok_or_else(|| BillingError::MedicineNotFound {
                            medicine_id: line.medicine_id.clone(),
                        })?;
                working.insert(line.medicine_id.clone(), fetched);
                line_order.push(line.medicine_id.clone());
            }
            let medicine = working
                .get_mut(&line.medicine_id)
                .ok_or_else(|| BillingError::Server("working set entry vanished".to_string()))?;

            // Aggregate fast-fail before any batch is touched.
            if medicine.total_stock < line.quantity {
                return Err(BillingError::InsufficientStock {
                    name: medicine.name.clone(),
                    available: medicine.total_stock,
                    requested: line.quantity,
                });
            }

            let outcome = consume_fefo(&medicine.batches, line.quantity).map_err(|shortfall| {
                BillingError::InsufficientBatchStock {
                    name: medicine.name.clone(),
                    available: shortfall.available,
                    requested: shortfall.requested,
                }
            })?;
            medicine.batches = outcome.batches;
            medicine.recompute_summary();

            // Expired-stock gate: judged against the billing date. The
            // first expired line redeems the override token for the whole
            // bill; later expired lines reuse the redeemed identity.
            let expired: Vec<_> = outcome
                .allocations
                .iter()
                .filter(|a| a.expiry_date < cart.billing_date)
                .cloned()
                .collect();
            let requires_override = !expired.is_empty();
            if requires_override {
                if redeemed.is_none() {
                    let token = cart.override_token.as_deref().ok_or_else(|| {
                        BillingError::OverrideRequired {
                            name: medicine.name.clone(),
                            lot_number: expired[0].lot_number.clone(),
                        }
                    })?;
                    let granted = OverrideTokenRepository::redeem(
                        &mut tx,
                        tenant_id,
                        token,
                        &cart.cashier_id,
                        &bill_number,
                        Utc::now(),
                    )
                    .await?
                    .ok_or(BillingError::InvalidOverrideToken)?;
                    redeemed = Some(granted);
                }
                for alloc in &expired {
                    expired_allocations.push(ExpiredAllocation {
                        medicine_id: medicine.id.clone(),
                        medicine_name: medicine.name.clone(),
                        lot_number: alloc.lot_number.clone(),
                        expiry_date: alloc.expiry_date,
                        quantity: alloc.quantity,
                    });
                }
            }

            if medicine.prescription_required && !rx_required.contains(&medicine.name) {
                rx_required.push(medicine.name.clone());
            }

            let rate = Money::from_cents(line.unit_rate_cents);
            let cost = medicine.unit_cost();
            items.push(BillItem {
                id: Uuid::new_v4().to_string(),
                medicine_id: medicine.id.clone(),
                medicine_name: medicine.name.clone(),
                quantity: line.quantity,
                unit_rate_cents: line.unit_rate_cents,
                unit_cost_cents: medicine.unit_cost_cents,
                line_total_cents: rate.times(line.quantity).cents(),
                line_profit_cents: (rate - cost).times(line.quantity).cents(),
                requires_override,
                allocations: outcome.allocations,
            });
        }

        // Prescription gate: decided only after per-line processing knows
        // which medicines demand one, but before anything commits.
        if !rx_required.is_empty() && cart.prescription.is_none() {
            return Err(BillingError::PrescriptionRequired {
                medicines: rx_required,
            });
        }

        let override_approval = redeemed.map(|granted| OverrideApproval {
            approved_by: granted.issued_by,
            reason: granted.reason,
            token_id: granted.id,
            expired_allocations,
        });

        // Persist: batch state per medicine (deterministic order), the
        // bill graph, and the mirrored revenue entry.
        for medicine_id in &line_order {
            if let Some(medicine) = working.get_mut(medicine_id) {
                CatalogRepository::save(&mut tx, medicine).await?;
            }
        }

        let draft = BillDraft {
            tenant_id: tenant_id.to_string(),
            bill_number: bill_number.clone(),
            client_request_id: cart.client_request_id.clone(),
            fiscal_year,
            sequence,
            customer_name: cart.customer_name.clone(),
            customer_contact: cart.customer_contact.clone(),
            payment_method: cart.payment_method,
            billing_date: cart.billing_date,
            discount_bps: discount.bps(),
            tax_bps: vat.bps(),
            prescription: cart.prescription.clone(),
        };
        let bill = Bill::new_finalized(
            draft,
            totals.subtotal,
            totals.discount,
            totals.taxable,
            totals.tax,
            totals.grand_total,
            items,
            override_approval,
        );

        BillRepository::insert_finalized(&mut tx, &bill)
            .await
            .map_err(|err| {
                if err.is_unique_violation() {
                    BillingError::DuplicateInvoiceNumber {
                        bill_number: bill.bill_number.clone(),
                    }
                } else {
                    err.into()
                }
            })?;

        let entry = LedgerEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            bill_number: bill.bill_number.clone(),
            kind: LedgerEntryKind::Sale,
            amount_cents: bill.grand_total_cents,
            entry_date: cart.billing_date,
            created_at: Utc::now(),
        };
        LedgerRepository::insert(&mut tx, &entry).await?;

        tx.commit().await.map_err(db_err)?;
        Ok((bill, entry))
    }

    /// Looks for an already-committed bill matching the cart's
    /// idempotency key or caller-supplied number.
    async fn find_existing(&self, tenant_id: &str, cart: &Cart) -> BillingResult<Option<Bill>> {
        if let Some(request_id) = &cart.client_request_id {
            let mut conn = self.db.pool().acquire().await.map_err(db_err)?;
            if let Some(bill) =
                BillRepository::find_by_request_id(&mut conn, tenant_id, request_id).await?
            {
                return Ok(Some(bill));
            }
        }
        if let Some(number) = &cart.bill_number {
            let mut conn = self.db.pool().acquire().await.map_err(db_err)?;
            if let Some(bill) = BillRepository::find_by_number(&mut conn, tenant_id, number).await? {
                return Ok(Some(bill));
            }
        }
        Ok(None)
    }

    /// Wraps an existing bill as an idempotent response. No audit entry:
    /// nothing was executed.
    async fn replay(&self, tenant_id: &str, bill: Bill) -> BillingResult<FinalizeOutcome> {
        let entries = self
            .db
            .ledger()
            .entries_for_bill(tenant_id, &bill.bill_number)
            .await?;
        let ledger_entry = entries
            .into_iter()
            .find(|e| e.kind == LedgerEntryKind::Sale);
        Ok(FinalizeOutcome {
            bill,
            ledger_entry,
            idempotent: true,
        })
    }

    // =========================================================================
    // Void
    // =========================================================================

    /// Voids a finalized bill: restores every embedded batch allocation
    /// onto the medicines' current batch lists, transitions the bill, and
    /// mirrors a reversing ledger entry — one transaction.
    ///
    /// Privilege note: voiding is restricted to elevated roles; that check
    /// belongs to the caller's authorization layer. `actor_id` is recorded
    /// on the bill and in the audit trail.
    pub async fn void_bill(
        &self,
        tenant_id: &str,
        actor_id: &str,
        bill_id: &str,
        reason: &str,
    ) -> BillingResult<Bill> {
        match self.try_void(tenant_id, actor_id, bill_id, reason).await {
            Ok(bill) => {
                info!(tenant_id, bill_number = %bill.bill_number, actor_id, "bill voided");
                self.audit(AuditEntry::new(
                    tenant_id,
                    actor_id,
                    "bill.void",
                    "bill",
                    bill.bill_number.clone(),
                    AuditStatus::Success,
                    Some(
                        json!({
                            "reason": reason,
                            "restored_amount_cents": bill.grand_total_cents,
                        })
                        .to_string(),
                    ),
                ))
                .await;
                Ok(bill)
            }
            Err(err) => {
                warn!(tenant_id, bill_id, code = err.code(), error = %err, "void aborted");
                self.audit(AuditEntry::new(
                    tenant_id,
                    actor_id,
                    "bill.void",
                    "bill",
                    bill_id,
                    AuditStatus::Failure,
                    Some(json!({ "code": err.code(), "message": err.to_string() }).to_string()),
                ))
                .await;
                Err(err)
            }
        }
    }

    async fn try_void(
        &self,
        tenant_id: &str,
        actor_id: &str,
        bill_id: &str,
        reason: &str,
    ) -> BillingResult<Bill> {
        let mut tx = self.db.pool().begin().await.map_err(db_err)?;

        let mut bill = BillRepository::find_by_id(&mut tx, tenant_id, bill_id)
            .await?
            .ok_or_else(|| BillingError::BillNotFound {
                bill_id: bill_id.to_string(),
            })?;

        // mark_voided carries the state guard: an already-voided bill is
        // rejected here before any stock moves.
        let now = Utc::now();
        bill.mark_voided(actor_id, reason, now)?;

        // Restore allocations medicine by medicine. Additive, so stock
        // received since the sale is unaffected. Any medicine that no
        // longer resolves aborts the whole transaction.
        let mut working: HashMap<String, Medicine> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for item in &bill.items {
            if !working.contains_key(&item.medicine_id) {
                let fetched =
                    CatalogRepository::find_for_tenant(&mut tx, &item.medicine_id, tenant_id)
                        .await?
                        .ok_or_else(|| BillingError::MedicineNotFound {
                            medicine_id: item.medicine_id.clone(),
                        })?;
                working.insert(item.medicine_id.clone(), fetched);
                order.push(item.medicine_id.clone());
            }
            let medicine = working
                .get_mut(&item.medicine_id)
                .ok_or_else(|| BillingError::Server("working set entry vanished".to_string()))?;
            medicine.batches = rxtill_core::batch::restore(&medicine.batches, &item.allocations);
        }

        for medicine_id in &order {
            if let Some(medicine) = working.get_mut(medicine_id) {
                CatalogRepository::save(&mut tx, medicine).await?;
            }
        }

        let transitioned =
            BillRepository::transition_to_voided(&mut tx, tenant_id, bill_id, actor_id, reason, now)
                .await?;
        if !transitioned {
            // Lost a race: someone voided between our read and our write.
            return Err(BillingError::BillAlreadyVoided {
                bill_number: bill.bill_number.clone(),
            });
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            bill_number: bill.bill_number.clone(),
            kind: LedgerEntryKind::VoidReversal,
            amount_cents: -bill.grand_total_cents,
            entry_date: now.date_naive(),
            created_at: now,
        };
        LedgerRepository::insert(&mut tx, &entry).await?;

        tx.commit().await.map_err(db_err)?;
        Ok(bill)
    }

    // =========================================================================
    // Override tokens
    // =========================================================================

    /// Issues a single-use token authorizing one sale of expired stock.
    /// The plaintext is returned exactly once.
    pub async fn issue_override_token(
        &self,
        tenant_id: &str,
        issuer_id: &str,
        reason: &str,
        ttl_minutes: i64,
    ) -> BillingResult<IssuedOverrideToken> {
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }

        let mut conn = self.db.pool().acquire().await.map_err(db_err)?;
        let issued =
            OverrideTokenRepository::issue(&mut conn, tenant_id, issuer_id, reason, ttl_minutes)
                .await?;
        drop(conn);

        info!(tenant_id, issuer_id, token_id = %issued.token_id, "override token issued");
        self.audit(AuditEntry::new(
            tenant_id,
            issuer_id,
            "override.issue",
            "override_token",
            issued.token_id.clone(),
            AuditStatus::Success,
            Some(
                json!({ "reason": reason, "expires_at": issued.expires_at.to_rfc3339() })
                    .to_string(),
            ),
        ))
        .await;

        Ok(issued)
    }

    // =========================================================================
    // Stock receipt
    // =========================================================================

    /// Receives purchased stock into a medicine's batch list (merge by
    /// lot + expiry, append otherwise) and audits the mutation.
    pub async fn receive_stock(
        &self,
        tenant_id: &str,
        actor_id: &str,
        medicine_id: &str,
        lot_number: &str,
        expiry_date: chrono::NaiveDate,
        quantity: i64,
    ) -> BillingResult<Medicine> {
        validation::validate_receipt_quantity(quantity)?;

        let mut tx = self.db.pool().begin().await.map_err(db_err)?;
        let medicine = CatalogRepository::receive_stock(
            &mut tx, tenant_id, medicine_id, lot_number, expiry_date, quantity,
        )
        .await
        .map_err(|err| match err {
            DbError::NotFound { .. } => BillingError::MedicineNotFound {
                medicine_id: medicine_id.to_string(),
            },
            other => other.into(),
        })?;
        tx.commit().await.map_err(db_err)?;

        self.audit(AuditEntry::new(
            tenant_id,
            actor_id,
            "stock.receive",
            "medicine",
            medicine_id,
            AuditStatus::Success,
            Some(
                json!({
                    "lot_number": lot_number,
                    "expiry_date": expiry_date.to_string(),
                    "quantity": quantity,
                    "total_stock": medicine.total_stock,
                })
                .to_string(),
            ),
        ))
        .await;

        Ok(medicine)
    }

    // =========================================================================
    // Prescription review
    // =========================================================================

    /// Updates a finalized bill's prescription verification state — one of
    /// the two sanctioned post-finalize mutations.
    pub async fn update_prescription_status(
        &self,
        tenant_id: &str,
        actor_id: &str,
        bill_id: &str,
        status: PrescriptionStatus,
        note: Option<&str>,
    ) -> BillingResult<()> {
        self.db
            .bills()
            .set_prescription_status(tenant_id, bill_id, status, note)
            .await
            .map_err(|err| match err {
                DbError::NotFound { .. } => BillingError::BillNotFound {
                    bill_id: bill_id.to_string(),
                },
                other => other.into(),
            })?;

        self.audit(AuditEntry::new(
            tenant_id,
            actor_id,
            "bill.prescription_review",
            "bill",
            bill_id,
            AuditStatus::Success,
            Some(json!({ "status": status, "note": note }).to_string()),
        ))
        .await;
        Ok(())
    }

    // =========================================================================
    // Audit helpers (best-effort, outside the transactions)
    // =========================================================================

    async fn audit(&self, entry: AuditEntry) {
        let repo: AuditRepository = self.db.audit();
        if let Err(err) = repo.append(&entry).await {
            // Audit failure must never fail the user-facing response.
            warn!(action = %entry.action, error = %err, "audit write failed");
        }
    }

    async fn audit_finalize_success(&self, tenant_id: &str, cart: &Cart, bill: &Bill) {
        let lines: Vec<_> = bill
            .items
            .iter()
            .map(|item| {
                json!({
                    "medicine_id": item.medicine_id,
                    "quantity": item.quantity,
                    "allocations": item
                        .allocations
                        .iter()
                        .map(|a| json!({
                            "lot_number": a.lot_number,
                            "expiry_date": a.expiry_date.to_string(),
                            "quantity": a.quantity,
                        }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        self.audit(AuditEntry::new(
            tenant_id,
            cart.cashier_id.clone(),
            "bill.finalize",
            "bill",
            bill.bill_number.clone(),
            AuditStatus::Success,
            Some(
                json!({
                    "grand_total_cents": bill.grand_total_cents,
                    "stock_adjustments": lines,
                    "override_used": bill.override_approval.is_some(),
                })
                .to_string(),
            ),
        ))
        .await;
    }

    async fn audit_finalize_failure(&self, tenant_id: &str, cart: &Cart, err: &BillingError) {
        let entity_id = cart
            .bill_number
            .clone()
            .or_else(|| cart.client_request_id.clone())
            .unwrap_or_else(|| "-".to_string());
        self.audit(AuditEntry::new(
            tenant_id,
            cart.cashier_id.clone(),
            "bill.finalize",
            "bill",
            entity_id,
            AuditStatus::Failure,
            Some(json!({ "code": err.code(), "message": err.to_string() }).to_string()),
        ))
        .await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
