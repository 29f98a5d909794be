//! # Fiscal Year & Invoice Numbers
//!
//! The fiscal-year cutover rule and the external invoice number format.
//!
//! Invoice numbers follow the literal format `PREFIX-FYSTART-FYENDSHORT-NNNNNN`
//! (6-digit zero-padded sequence), e.g. `IRD-2081-82-000007`. The format is
//! part of the durable external contract: reconciliation tooling parses
//! numbers back into (prefix, fiscal-year label, sequence), so formatting
//! and parsing must round-trip exactly.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::INVOICE_SEQUENCE_WIDTH;

// =============================================================================
// Fiscal Year Rule
// =============================================================================

/// The jurisdiction's fiscal-year boundary, as configuration data.
///
/// A billing date on or after the cutover day belongs to the fiscal year
/// starting that calendar year; earlier dates belong to the previous one.
/// `year_offset` shifts the Gregorian year into the jurisdiction's own
/// numbering (the default +57 approximates the Bikram Sambat calendar, so
/// 2024-07-20 labels as `2081-82`).
///
/// Other jurisdictions change this value, not the sequencer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FiscalYearRule {
    /// Month of the cutover day (1-12).
    pub cutover_month: u32,
    /// Day of the cutover within that month.
    pub cutover_day: u32,
    /// Added to the Gregorian year to form the label's year numbers.
    pub year_offset: i32,
}

impl FiscalYearRule {
    /// Creates a rule with an explicit cutover and offset.
    pub const fn new(cutover_month: u32, cutover_day: u32, year_offset: i32) -> Self {
        FiscalYearRule {
            cutover_month,
            cutover_day,
            year_offset,
        }
    }

    /// Derives the fiscal-year label (e.g. `2081-82`) for a billing date.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use rxtill_core::fiscal::FiscalYearRule;
    ///
    /// let rule = FiscalYearRule::default();
    /// let d = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
    /// assert_eq!(rule.label(d), "2081-82");
    /// let d = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    /// assert_eq!(rule.label(d), "2080-81");
    /// ```
    pub fn label(&self, date: NaiveDate) -> String {
        let after_cutover = (date.month(), date.day()) >= (self.cutover_month, self.cutover_day);
        let start_year = if after_cutover {
            date.year() + self.year_offset
        } else {
            date.year() + self.year_offset - 1
        };
        format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100))
    }
}

impl Default for FiscalYearRule {
    /// Mid-July cutover, Bikram Sambat year numbering.
    fn default() -> Self {
        FiscalYearRule::new(7, 16, 57)
    }
}

// =============================================================================
// Invoice Number
// =============================================================================

/// A parsed external invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceNumber {
    pub prefix: String,
    /// Fiscal-year label, e.g. `2081-82`.
    pub fiscal_year: String,
    pub sequence: i64,
}

impl InvoiceNumber {
    /// Formats an invoice number: prefix, fiscal-year label, zero-padded
    /// sequence.
    ///
    /// ## Example
    /// ```rust
    /// use rxtill_core::fiscal::InvoiceNumber;
    ///
    /// assert_eq!(InvoiceNumber::format("IRD", "2081-82", 7), "IRD-2081-82-000007");
    /// ```
    pub fn format(prefix: &str, fiscal_year: &str, sequence: i64) -> String {
        format!("{prefix}-{fiscal_year}-{sequence:0width$}", width = INVOICE_SEQUENCE_WIDTH)
    }

    /// Parses an invoice number back into its parts.
    ///
    /// Splits from the right: the last `-` segment is the sequence, the two
    /// before it form the fiscal-year label, everything left is the prefix
    /// (which may itself contain hyphens).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "bill_number".to_string(),
            reason: reason.to_string(),
        };

        let (head, seq_part) = value
            .rsplit_once('-')
            .ok_or_else(|| invalid("expected PREFIX-FYSTART-FYENDSHORT-NNNNNN"))?;
        if seq_part.is_empty() || !seq_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("sequence must be numeric"));
        }
        let sequence: i64 = seq_part
            .parse()
            .map_err(|_| invalid("sequence out of range"))?;

        let (head, fy_end) = head
            .rsplit_once('-')
            .ok_or_else(|| invalid("missing fiscal year label"))?;
        let (prefix, fy_start) = head
            .rsplit_once('-')
            .ok_or_else(|| invalid("missing fiscal year label"))?;
        if fy_start.is_empty()
            || fy_end.is_empty()
            || !fy_start.bytes().all(|b| b.is_ascii_digit())
            || !fy_end.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("fiscal year label must be numeric"));
        }
        if prefix.is_empty() {
            return Err(invalid("prefix is empty"));
        }

        Ok(InvoiceNumber {
            prefix: prefix.to_string(),
            fiscal_year: format!("{fy_start}-{fy_end}"),
            sequence,
        })
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&InvoiceNumber::format(&self.prefix, &self.fiscal_year, self.sequence))
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

    #[test]
    fn test_label_cutover_boundary() {
        let rule = FiscalYearRule::default();
        assert_eq!(rule.label(date(2024, 7, 15)), "2080-81");
        assert_eq!(rule.label(date(2024, 7, 16)), "2081-82");
        assert_eq!(rule.label(date(2025, 1, 3)), "2081-82");
        assert_eq!(rule.label(date(2025, 7, 16)), "2082-83");
    }

    #[test]
    fn test_label_with_custom_rule() {
        // Gregorian fiscal year starting April 1 (no offset).
        let rule = FiscalYearRule::new(4, 1, 0);
        assert_eq!(rule.label(date(2024, 3, 31)), "2023-24");
        assert_eq!(rule.label(date(2024, 4, 1)), "2024-25");
    }

    #[test]
    fn test_format_pads_sequence() {
        assert_eq!(InvoiceNumber::format("IRD", "2081-82", 7), "IRD-2081-82-000007");
        assert_eq!(InvoiceNumber::format("IRD", "2081-82", 123456), "IRD-2081-82-123456");
    }

    #[test]
    fn test_parse_round_trips() {
        let parsed = InvoiceNumber::parse("IRD-2081-82-000007").unwrap();
        assert_eq!(parsed.prefix, "IRD");
        assert_eq!(parsed.fiscal_year, "2081-82");
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.to_string(), "IRD-2081-82-000007");
    }

    #[test]
    fn test_parse_hyphenated_prefix() {
        let parsed = InvoiceNumber::parse("RX-KTM-2081-82-000042").unwrap();
        assert_eq!(parsed.prefix, "RX-KTM");
        assert_eq!(parsed.fiscal_year, "2081-82");
        assert_eq!(parsed.sequence, 42);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(InvoiceNumber::parse("").is_err());
        assert!(InvoiceNumber::parse("IRD").is_err());
        assert!(InvoiceNumber::parse("IRD-2081-82-abc").is_err());
        assert!(InvoiceNumber::parse("-2081-82-000001").is_err());
        assert!(InvoiceNumber::parse("IRD-20xx-82-000001").is_err());
    }

    #[test]
    fn test_format_parse_property() {
        for seq in [1, 7, 999, 100000, 999999, 1000000] {
            let formatted = InvoiceNumber::format("IRD", "2081-82", seq);
            let parsed = InvoiceNumber::parse(&formatted).unwrap();
            assert_eq!(parsed.sequence, seq);
            assert_eq!(parsed.fiscal_year, "2081-82");
        }
    }
}
