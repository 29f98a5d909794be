//! # Error Types
//!
//! The billing error taxonomy surfaced to callers of the engine, plus
//! field-level validation errors.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rxtill-core errors (this file)                                        │
//! │  ├── BillingError     - Stable-coded errors from finalize/void         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rxtill-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → BillingError ← DbError (as Server)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medicine name, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant carries a stable machine-readable code for clients

use thiserror::Error;

// =============================================================================
// Billing Error
// =============================================================================

/// Errors produced by bill finalization, voiding, and override issuance.
///
/// Concurrency races on idempotency keys are resolved internally by the
/// engine (the winning record is returned); only a genuine collision on a
/// caller-supplied invoice number reaches the caller, as
/// [`BillingError::DuplicateInvoiceNumber`], which is safe to retry.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Cart shape or field content rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Medicine id does not resolve within the tenant.
    #[error("medicine not found: {medicine_id}")]
    MedicineNotFound { medicine_id: String },

    /// Aggregate stock across all batches is short of the requested
    /// quantity. Raised before any batch is touched.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Batch-level stock is short even though the aggregate looked
    /// sufficient (expiry segmentation, racing consumption).
    #[error("insufficient batch stock for {name}: batches hold {available}, requested {requested}")]
    InsufficientBatchStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The cart contains prescription-only medicines but carries no
    /// prescription record.
    #[error("prescription required for: {}", medicines.join(", "))]
    PrescriptionRequired { medicines: Vec<String> },

    /// The cart would consume expired stock and no override token was
    /// presented.
    #[error("selling expired stock ({name}, lot {lot_number}) requires an override token")]
    OverrideRequired { name: String, lot_number: String },

    /// The presented override token is unknown, already used, or expired.
    /// The three cases are deliberately indistinguishable to the caller.
    #[error("invalid, used, or expired override token")]
    InvalidOverrideToken,

    /// A caller-supplied invoice number collided with an existing bill
    /// that does not belong to this request. Retry-safe.
    #[error("duplicate invoice number: {bill_number}")]
    DuplicateInvoiceNumber { bill_number: String },

    /// Void target does not exist within the tenant.
    #[error("bill not found: {bill_id}")]
    BillNotFound { bill_id: String },

    /// Re-voiding an already-voided bill is rejected, not silently
    /// accepted.
    #[error("bill {bill_number} is already voided")]
    BillAlreadyVoided { bill_number: String },

    /// Infrastructure failure (transaction abort, storage unavailable).
    /// Details are logged; the caller sees a generic message.
    #[error("internal server error: {0}")]
    Server(String),
}

impl BillingError {
    /// Stable machine-readable code for client-side dispatch.
    ///
    /// These strings are part of the external contract and must never be
    /// renamed once released.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "VALIDATION_FAILED",
            BillingError::MedicineNotFound { .. } => "MEDICINE_NOT_FOUND",
            BillingError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            BillingError::InsufficientBatchStock { .. } => "INSUFFICIENT_BATCH_STOCK",
            BillingError::PrescriptionRequired { .. } => "PRESCRIPTION_REQUIRED",
            BillingError::OverrideRequired { .. } => "OVERRIDE_REQUIRED",
            BillingError::InvalidOverrideToken => "INVALID_OVERRIDE_TOKEN",
            BillingError::DuplicateInvoiceNumber { .. } => "DUPLICATE_INVOICE_NUMBER",
            BillingError::BillNotFound { .. } => "BILL_NOT_FOUND",
            BillingError::BillAlreadyVoided { .. } => "BILL_ALREADY_VOIDED",
            BillingError::Server(_) => "SERVER_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a cart or request field doesn't meet requirements.
/// Used for early validation before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed invoice number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection has too many entries.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with BillingError.
pub type BillingResult<T> = Result<T, BillingError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BillingError::InsufficientStock {
            name: "Paracetamol 500mg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Paracetamol 500mg: available 3, requested 5"
        );
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_prescription_error_lists_medicines() {
        let err = BillingError::PrescriptionRequired {
            medicines: vec!["Amoxicillin".to_string(), "Tramadol".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "prescription required for: Amoxicillin, Tramadol"
        );
    }

    #[test]
    fn test_validation_converts_to_billing_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        let billing_err: BillingError = validation_err.into();
        assert!(matches!(billing_err, BillingError::Validation(_)));
        assert_eq!(billing_err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(BillingError::InvalidOverrideToken.code(), "INVALID_OVERRIDE_TOKEN");
        assert_eq!(
            BillingError::DuplicateInvoiceNumber {
                bill_number: "IRD-2081-82-000007".to_string()
            }
            .code(),
            "DUPLICATE_INVOICE_NUMBER"
        );
        assert_eq!(BillingError::Server("boom".to_string()).code(), "SERVER_ERROR");
    }
}
