//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `Percent` type used for discount and VAT rates.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paisa (hundredths)                               │
//! │    Every amount is an i64 count of the smallest currency unit.          │
//! │    Percentage applications round half-up at that step, so stored        │
//! │    totals always match what a till redisplays.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paisa; hundredths).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for void reversals
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use rxtill_core::money::Money;
    ///
    /// let price = Money::from_cents(40680); // Rs 406.80
    /// assert_eq!(price.cents(), 40680);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage and returns the resulting amount, rounded
    /// half-up at this step.
    ///
    /// Totals are assembled from already-rounded parts, never recomputed
    /// from unrounded intermediates, so a redisplayed subtotal always
    /// matches the stored one.
    ///
    /// ## Example
    /// ```rust
    /// use rxtill_core::money::{Money, Percent};
    ///
    /// let taxable = Money::from_cents(36000);      // Rs 360.00
    /// let vat = Percent::from_bps(1300);           // 13%
    /// assert_eq!(taxable.apply(vat).cents(), 4680); // Rs 46.80
    /// ```
    pub fn apply(&self, rate: Percent) -> Money {
        // i128 intermediate prevents overflow on large amounts
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use rxtill_core::money::Money;
    ///
    /// let unit_rate = Money::from_cents(10000); // Rs 100.00
    /// assert_eq!(unit_rate.times(3).cents(), 30000);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points (bps), used for discount and VAT rates.
///
/// 1 basis point = 0.01% = 1/10000. 1300 bps = 13% (the default VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percent(pct: f64) -> Self {
        Percent((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in a human-readable format. For debugging; the
/// frontend formats for actual display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation for void reversal entries.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(40680);
        assert_eq!(money.cents(), 40680);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(40680)), "406.80");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_apply_percent_basic() {
        // Rs 400.00 at 10% = Rs 40.00
        let amount = Money::from_cents(40000);
        let rate = Percent::from_bps(1000);
        assert_eq!(amount.apply(rate).cents(), 4000);
    }

    #[test]
    fn test_apply_percent_with_rounding() {
        // Rs 10.00 at 8.25% = 0.825 → 0.83 half-up
        let amount = Money::from_cents(1000);
        let rate = Percent::from_bps(825);
        assert_eq!(amount.apply(rate).cents(), 83);
    }

    #[test]
    fn test_percent_from_percent() {
        assert_eq!(Percent::from_percent(13.0).bps(), 1300);
        assert_eq!(Percent::from_percent(8.25).bps(), 825);
    }

    #[test]
    fn test_times() {
        let unit_rate = Money::from_cents(5000);
        assert_eq!(unit_rate.times(2).cents(), 10000);
    }
}
