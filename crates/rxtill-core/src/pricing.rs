//! # Cart Pricing
//!
//! Turns cart lines plus a discount and VAT rate into the five stored
//! totals. All arithmetic is integer cents with half-up rounding applied
//! at each aggregation step — never only at the end — so redisplayed
//! subtotals always match stored ones.
//!
//! ```text
//! line totals ──► subtotal ──► discount ──► taxable ──► tax ──► grand total
//!                  (sum)      (subtotal×d%)  (sub−disc)  (tax%)  (taxable+tax)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percent};
use crate::types::CartLine;

// =============================================================================
// Priced Cart
// =============================================================================

/// The five totals stored on a bill, plus the rates that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedCart {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    pub tax: Money,
    pub grand_total: Money,
    pub discount_rate: Percent,
    pub tax_rate: Percent,
}

/// Line amount: quantity × unit rate.
#[inline]
pub fn line_total(line: &CartLine) -> Money {
    Money::from_cents(line.unit_rate_cents).times(line.quantity)
}

/// Prices a cart.
///
/// ## Example
/// ```rust
/// use rxtill_core::money::Percent;
/// use rxtill_core::pricing::price;
/// use rxtill_core::types::CartLine;
///
/// let lines = vec![
///     CartLine { medicine_id: "a".into(), quantity: 3, unit_rate_cents: 10000 },
///     CartLine { medicine_id: "b".into(), quantity: 2, unit_rate_cents: 5000 },
/// ];
/// let priced = price(&lines, Percent::from_bps(1000), Percent::from_bps(1300));
/// assert_eq!(priced.grand_total.cents(), 40680); // Rs 406.80
/// ```
pub fn price(lines: &[CartLine], discount_rate: Percent, tax_rate: Percent) -> PricedCart {
    let mut subtotal = Money::zero();
    for line in lines {
        subtotal += line_total(line);
    }

    let discount = subtotal.apply(discount_rate);
    let taxable = subtotal - discount;
    let tax = taxable.apply(tax_rate);
    let grand_total = taxable + tax;

    PricedCart {
        subtotal,
        discount,
        taxable,
        tax,
        grand_total,
        discount_rate,
        tax_rate,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: i64, rate_cents: i64) -> CartLine {
        CartLine {
            medicine_id: "m".into(),
            quantity: qty,
            unit_rate_cents: rate_cents,
        }
    }

    #[test]
    fn test_reference_arithmetic() {
        // qty 3 @ 100.00 + qty 2 @ 50.00, 10% discount, 13% VAT
        let lines = vec![line(3, 10000), line(2, 5000)];
        let priced = price(&lines, Percent::from_bps(1000), Percent::from_bps(1300));

        assert_eq!(priced.subtotal.cents(), 40000); // 400.00
        assert_eq!(priced.discount.cents(), 4000); // 40.00
        assert_eq!(priced.taxable.cents(), 36000); // 360.00
        assert_eq!(priced.tax.cents(), 4680); // 46.80
        assert_eq!(priced.grand_total.cents(), 40680); // 406.80
    }

    #[test]
    fn test_zero_rates() {
        let lines = vec![line(1, 9999)];
        let priced = price(&lines, Percent::zero(), Percent::zero());
        assert_eq!(priced.subtotal.cents(), 9999);
        assert_eq!(priced.discount.cents(), 0);
        assert_eq!(priced.tax.cents(), 0);
        assert_eq!(priced.grand_total.cents(), 9999);
    }

    #[test]
    fn test_rounding_happens_per_step() {
        // Subtotal 99.99, discount 3.33% → 3.33 (332.9667 rounds to 333),
        // taxable 96.66, tax 13% → 12.57 (1256.58 rounds to 1257).
        let lines = vec![line(1, 9999)];
        let priced = price(&lines, Percent::from_bps(333), Percent::from_bps(1300));
        assert_eq!(priced.discount.cents(), 333);
        assert_eq!(priced.taxable.cents(), 9666);
        assert_eq!(priced.tax.cents(), 1257);
        assert_eq!(priced.grand_total.cents(), 10923);
        // Grand total is assembled from rounded parts.
        assert_eq!(
            priced.grand_total.cents(),
            priced.taxable.cents() + priced.tax.cents()
        );
    }

    #[test]
    fn test_empty_cart_prices_to_zero() {
        let priced = price(&[], Percent::from_bps(1000), Percent::from_bps(1300));
        assert!(priced.grand_total.is_zero());
    }
}
