//! # Batch Inventory Ledger
//!
//! Expiry-dated lot tracking for a single medicine, and the three pure
//! operations every stock-touching path in the system goes through:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Batch Inventory Ledger                              │
//! │                                                                         │
//! │  consume_fefo(batches, qty)                                            │
//! │     └── earliest expiry first, all-or-nothing                          │
//! │         returns the exact (lot, expiry, qty) allocations taken         │
//! │                                                                         │
//! │  restore(batches, allocations)                                         │
//! │     └── exact inverse of consume: add back by (lot, expiry),           │
//! │         appending a new lot when no match exists. Never fails.         │
//! │                                                                         │
//! │  summarize(batches)                                                    │
//! │     └── aggregate quantity + soonest expiry + its lot,                 │
//! │         recomputed from the list (never hand-edited)                   │
//! │                                                                         │
//! │  Callers: bill finalize, bill void, stock receipt — ONE shared         │
//! │  implementation, no per-caller reimplementation.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Types
// =============================================================================

/// A quantity of stock sharing one expiry date, identified by a lot number.
/// Owned exclusively by its medicine; quantity never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Batch {
    /// Lot number as printed on the packaging.
    pub lot_number: String,

    /// Expiry date of every unit in this lot.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    /// Units remaining. Zero means logically empty; the entry may be
    /// retained or pruned by stock maintenance.
    pub quantity: i64,
}

impl Batch {
    /// Creates a batch.
    pub fn new(lot_number: impl Into<String>, expiry_date: NaiveDate, quantity: i64) -> Self {
        Batch {
            lot_number: lot_number.into(),
            expiry_date,
            quantity,
        }
    }

    /// A batch counts toward stock only with a lot number and positive
    /// quantity.
    fn is_live(&self) -> bool {
        self.quantity > 0 && !self.lot_number.trim().is_empty()
    }
}

/// One slice of a FEFO consumption: how much was taken from which lot.
///
/// Embedded verbatim into the bill's line items so a later void can
/// restore exactly what was consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchAllocation {
    pub lot_number: String,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    /// Units taken from this lot.
    pub quantity: i64,
}

/// Aggregate view over a batch list. Pure function of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub total_quantity: i64,
    #[ts(as = "Option<String>")]
    pub next_expiry: Option<NaiveDate>,
    pub next_expiry_lot: Option<String>,
}

/// Result of a successful FEFO consumption.
#[derive(Debug, Clone)]
pub struct FefoOutcome {
    /// Allocations in the order they were taken (ascending expiry).
    pub allocations: Vec<BatchAllocation>,
    /// The batch list after subtraction. Exhausted lots stay in the list
    /// with quantity zero.
    pub batches: Vec<Batch>,
}

/// Shortfall detail when batches cannot cover a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockShortfall {
    pub available: i64,
    pub requested: i64,
}

// =============================================================================
// Operations
// =============================================================================

/// Consumes `quantity` units following First-Expired-First-Out order.
///
/// Batches are taken in ascending expiry order; equal expiry dates keep
/// their list (insertion) order — the tie-break is arbitrary but
/// deterministic. The operation is all-or-nothing: if the live batches
/// cannot cover the request, nothing is consumed and the shortfall is
/// returned.
///
/// Callers must reject `quantity <= 0` before reaching this function.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use rxtill_core::batch::{consume_fefo, Batch};
///
/// let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let batches = vec![
///     Batch::new("B2", d(2025, 6, 1), 10),
///     Batch::new("B1", d(2025, 1, 1), 5),
/// ];
/// let out = consume_fefo(&batches, 7).unwrap();
/// assert_eq!(out.allocations[0].lot_number, "B1"); // earliest expiry first
/// assert_eq!(out.allocations[0].quantity, 5);
/// assert_eq!(out.allocations[1].quantity, 2);
/// ```
pub fn consume_fefo(batches: &[Batch], quantity: i64) -> Result<FefoOutcome, StockShortfall> {
    let available: i64 = batches.iter().filter(|b| b.is_live()).map(|b| b.quantity).sum();
    if available < quantity {
        return Err(StockShortfall {
            available,
            requested: quantity,
        });
    }

    let mut next = batches.to_vec();

    // Stable sort of indices: ascending expiry, ties keep list order.
    let mut order: Vec<usize> = (0..next.len()).collect();
    order.sort_by_key(|&i| next[i].expiry_date);

    let mut remaining = quantity;
    let mut allocations = Vec::new();
    for i in order {
        if remaining == 0 {
            break;
        }
        let batch = &mut next[i];
        if !batch.is_live() {
            continue;
        }
        let take = remaining.min(batch.quantity);
        batch.quantity -= take;
        remaining -= take;
        allocations.push(BatchAllocation {
            lot_number: batch.lot_number.clone(),
            expiry_date: batch.expiry_date,
            quantity: take,
        });
    }

    Ok(FefoOutcome {
        allocations,
        batches: next,
    })
}

/// Restores previously consumed allocations onto a batch list.
///
/// The exact inverse of [`consume_fefo`]: each allocation is added back to
/// the batch matching its (lot, expiry) pair; when no match exists (the
/// lot was exhausted and pruned since) a new entry is appended. Additive,
/// so it is safe against interleaved stock-ins, and it never fails.
pub fn restore(batches: &[Batch], allocations: &[BatchAllocation]) -> Vec<Batch> {
    let mut next = batches.to_vec();
    for alloc in allocations {
        match next
            .iter_mut()
            .find(|b| b.lot_number == alloc.lot_number && b.expiry_date == alloc.expiry_date)
        {
            Some(batch) => batch.quantity += alloc.quantity,
            None => next.push(Batch {
                lot_number: alloc.lot_number.clone(),
                expiry_date: alloc.expiry_date,
                quantity: alloc.quantity,
            }),
        }
    }
    next
}

/// Recomputes the aggregate stock quantity and the soonest expiry (with
/// its lot) from a batch list.
///
/// Non-positive quantities and entries without a lot number are filtered
/// out first. The medicine's summary columns are always overwritten with
/// this result on save — they are never hand-edited.
pub fn summarize(batches: &[Batch]) -> StockSummary {
    let total_quantity = batches.iter().filter(|b| b.is_live()).map(|b| b.quantity).sum();

    // min_by_key keeps the first of equal minimums: same tie-break as FEFO.
    let next = batches
        .iter()
        .filter(|b| b.is_live())
        .min_by_key(|b| b.expiry_date);

    StockSummary {
        total_quantity,
        next_expiry: next.map(|b| b.expiry_date),
        next_expiry_lot: next.map(|b| b.lot_number.clone()),
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

    fn lots(batches: &[Batch]) -> Vec<(&str, i64)> {
        batches.iter().map(|b| (b.lot_number.as_str(), b.quantity)).collect()
    }

    #[test]
    fn test_fefo_takes_earliest_expiry_first() {
        let batches = vec![
            Batch::new("late", date(2026, 1, 1), 10),
            Batch::new("early", date(2025, 1, 1), 5),
            Batch::new("mid", date(2025, 6, 1), 8),
        ];

        let out = consume_fefo(&batches, 14).unwrap();

        assert_eq!(
            out.allocations,
            vec![
                BatchAllocation { lot_number: "early".into(), expiry_date: date(2025, 1, 1), quantity: 5 },
                BatchAllocation { lot_number: "mid".into(), expiry_date: date(2025, 6, 1), quantity: 8 },
                BatchAllocation { lot_number: "late".into(), expiry_date: date(2026, 1, 1), quantity: 1 },
            ]
        );
        assert_eq!(lots(&out.batches), vec![("late", 9), ("early", 0), ("mid", 0)]);
    }

    #[test]
    fn test_fefo_expiry_order_is_strictly_ascending() {
        let batches = vec![
            Batch::new("c", date(2025, 9, 1), 3),
            Batch::new("a", date(2025, 1, 1), 3),
            Batch::new("b", date(2025, 5, 1), 3),
        ];

        let out = consume_fefo(&batches, 9).unwrap();
        let expiries: Vec<NaiveDate> = out.allocations.iter().map(|a| a.expiry_date).collect();
        let mut sorted = expiries.clone();
        sorted.sort();
        assert_eq!(expiries, sorted);
    }

    #[test]
    fn test_fefo_equal_expiry_keeps_list_order() {
        let same_day = date(2025, 3, 1);
        let batches = vec![
            Batch::new("first", same_day, 2),
            Batch::new("second", same_day, 2),
        ];

        let out = consume_fefo(&batches, 3).unwrap();
        assert_eq!(out.allocations[0].lot_number, "first");
        assert_eq!(out.allocations[0].quantity, 2);
        assert_eq!(out.allocations[1].lot_number, "second");
        assert_eq!(out.allocations[1].quantity, 1);
    }

    #[test]
    fn test_fefo_shortfall_mutates_nothing() {
        let batches = vec![
            Batch::new("a", date(2025, 1, 1), 5),
            Batch::new("b", date(2025, 6, 1), 10),
        ];

        let err = consume_fefo(&batches, 16).unwrap_err();
        assert_eq!(err, StockShortfall { available: 15, requested: 16 });
        // Input is untouched (consume works on a copy).
        assert_eq!(lots(&batches), vec![("a", 5), ("b", 10)]);
    }

    #[test]
    fn test_fefo_skips_empty_and_malformed_batches() {
        let batches = vec![
            Batch::new("", date(2024, 1, 1), 50),   // no lot number
            Batch::new("dead", date(2024, 6, 1), 0), // exhausted
            Batch::new("live", date(2025, 1, 1), 5),
        ];

        let out = consume_fefo(&batches, 5).unwrap();
        assert_eq!(out.allocations.len(), 1);
        assert_eq!(out.allocations[0].lot_number, "live");
    }

    #[test]
    fn test_restore_is_exact_inverse_of_consume() {
        let batches = vec![
            Batch::new("a", date(2025, 1, 1), 5),
            Batch::new("b", date(2025, 6, 1), 10),
        ];

        let out = consume_fefo(&batches, 7).unwrap();
        let restored = restore(&out.batches, &out.allocations);

        assert_eq!(summarize(&restored).total_quantity, summarize(&batches).total_quantity);
        // Total per lot-key round-trips.
        for b in &batches {
            let total: i64 = restored
                .iter()
                .filter(|r| r.lot_number == b.lot_number && r.expiry_date == b.expiry_date)
                .map(|r| r.quantity)
                .sum();
            assert_eq!(total, b.quantity, "lot {}", b.lot_number);
        }
    }

    #[test]
    fn test_restore_appends_unknown_lot() {
        let batches = vec![Batch::new("a", date(2025, 1, 1), 5)];
        let allocations = vec![BatchAllocation {
            lot_number: "pruned".into(),
            expiry_date: date(2024, 12, 1),
            quantity: 3,
        }];

        let restored = restore(&batches, &allocations);
        assert_eq!(lots(&restored), vec![("a", 5), ("pruned", 3)]);
    }

    #[test]
    fn test_restore_is_additive_on_lot_match() {
        let batches = vec![Batch::new("a", date(2025, 1, 1), 5)];
        let allocations = vec![BatchAllocation {
            lot_number: "a".into(),
            expiry_date: date(2025, 1, 1),
            quantity: 2,
        }];

        let restored = restore(&batches, &allocations);
        assert_eq!(lots(&restored), vec![("a", 7)]);
    }

    #[test]
    fn test_restore_same_lot_different_expiry_is_a_new_entry() {
        let batches = vec![Batch::new("a", date(2025, 1, 1), 5)];
        let allocations = vec![BatchAllocation {
            lot_number: "a".into(),
            expiry_date: date(2026, 1, 1),
            quantity: 2,
        }];

        let restored = restore(&batches, &allocations);
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_summarize_filters_and_finds_next_expiry() {
        let batches = vec![
            Batch::new("junk", date(2024, 1, 1), 0),
            Batch::new("", date(2024, 2, 1), 10),
            Batch::new("b", date(2025, 6, 1), 10),
            Batch::new("a", date(2025, 1, 1), 5),
        ];

        let summary = summarize(&batches);
        assert_eq!(summary.total_quantity, 15);
        assert_eq!(summary.next_expiry, Some(date(2025, 1, 1)));
        assert_eq!(summary.next_expiry_lot.as_deref(), Some("a"));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_quantity, 0);
        assert_eq!(summary.next_expiry, None);
        assert_eq!(summary.next_expiry_lot, None);
    }
}
