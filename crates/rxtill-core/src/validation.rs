//! # Validation Module
//!
//! Cart and input validation for the billing engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host application                                             │
//! │  ├── Request shape, auth, tenant resolution                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Cart shape: lines present, quantities positive, rates sane        │
//! │  └── Field-level errors before any side effect                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (batch quantity ≥ 0)                            │
//! │  ├── UNIQUE constraints (bill number, request id)                      │
//! │  └── Write-once triggers on bills and the audit log                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Cart;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Validation
// =============================================================================

/// Validates a cart before finalization touches anything.
///
/// ## Rules
/// - At least one line, at most [`MAX_CART_ITEMS`]
/// - Every quantity positive and within [`MAX_ITEM_QUANTITY`]
/// - Every unit rate non-negative (zero allowed for free/sample items)
/// - Customer name present
/// - Discount within 0–100%
/// - Idempotency key and external bill number non-empty when supplied
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    if cart.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if cart.lines.len() > MAX_CART_ITEMS {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_CART_ITEMS,
        });
    }

    for (idx, line) in cart.lines.iter().enumerate() {
        if line.medicine_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("lines[{idx}].medicine_id"),
            });
        }
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("lines[{idx}].quantity"),
            });
        }
        if line.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: format!("lines[{idx}].quantity"),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if line.unit_rate_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: format!("lines[{idx}].unit_rate_cents"),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    validate_customer_name(&cart.customer_name)?;
    validate_discount_bps(cart.discount_bps)?;

    if let Some(request_id) = &cart.client_request_id {
        validate_opaque_key("client_request_id", request_id)?;
    }
    if let Some(number) = &cart.bill_number {
        validate_opaque_key("bill_number", number)?;
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a customer name.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a discount rate in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "discount_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a caller-supplied opaque key (idempotency key, external bill
/// number): non-empty, bounded length.
pub fn validate_opaque_key(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a stock-receipt quantity.
pub fn validate_receipt_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, PaymentMethod, Prescription};
    use chrono::NaiveDate;

    fn valid_cart() -> Cart {
        Cart {
            client_request_id: Some("req-1".into()),
            bill_number: None,
            customer_name: "Walk-in".into(),
            customer_contact: None,
            billing_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            payment_method: PaymentMethod::Cash,
            discount_bps: 1000,
            lines: vec![CartLine {
                medicine_id: "m1".into(),
                quantity: 2,
                unit_rate_cents: 5000,
            }],
            prescription: Prescription::None,
            override_token: None,
            cashier_id: "cashier-1".into(),
        }
    }

    #[test]
    fn test_valid_cart_passes() {
        assert!(validate_cart(&valid_cart()).is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let mut cart = valid_cart();
        cart.lines.clear();
        assert!(matches!(
            validate_cart(&cart),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut cart = valid_cart();
        cart.lines[0].quantity = 0;
        assert!(matches!(
            validate_cart(&cart),
            Err(ValidationError::MustBePositive { .. })
        ));

        cart.lines[0].quantity = -3;
        assert!(validate_cart(&cart).is_err());
    }

    #[test]
    fn test_negative_rate_rejected_zero_allowed() {
        let mut cart = valid_cart();
        cart.lines[0].unit_rate_cents = -1;
        assert!(validate_cart(&cart).is_err());

        cart.lines[0].unit_rate_cents = 0;
        assert!(validate_cart(&cart).is_ok());
    }

    #[test]
    fn test_blank_customer_rejected() {
        let mut cart = valid_cart();
        cart.customer_name = "   ".into();
        assert!(validate_cart(&cart).is_err());
    }

    #[test]
    fn test_discount_over_100_percent_rejected() {
        let mut cart = valid_cart();
        cart.discount_bps = 10001;
        assert!(validate_cart(&cart).is_err());
    }

    #[test]
    fn test_empty_request_id_rejected() {
        let mut cart = valid_cart();
        cart.client_request_id = Some("".into());
        assert!(validate_cart(&cart).is_err());
    }

    #[test]
    fn test_receipt_quantity() {
        assert!(validate_receipt_quantity(1).is_ok());
        assert!(validate_receipt_quantity(0).is_err());
        assert!(validate_receipt_quantity(-5).is_err());
    }
}
