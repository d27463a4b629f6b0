//! # Sales Aggregation Engine
//!
//! Walks filtered sales and their line items, splits every line into gross
//! or returns, and accumulates global totals plus per-day buckets in the
//! reporting time zone.
//!
//! ## Accumulation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Per-Sale Accumulation                              │
//! │                                                                         │
//! │  sale.total_price / total_tax ───────────► cross-check sums             │
//! │        (sale-level, platform-reported)     (validate line aggregation)  │
//! │                                                                         │
//! │  sale.sale_date ──► local date in zone ──► day-bucket key               │
//! │                     ("unknown" when missing/unparsable)                 │
//! │                                                                         │
//! │  each line:                                                             │
//! │    total_discount ───────────────────────► global discount sum (always) │
//! │    gross line    ──► bucket.gross  + totals.gross                       │
//! │    returns line  ──► bucket.returns + totals.returns                    │
//! │                                                                         │
//! │  after lines: ≥1 gross line ──► bucket.gross_sale_count += 1            │
//! │               ≥1 line       ──► bucket.net_sale_count   += 1            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Accumulators are freshly allocated per call and returned to the caller;
//! nothing is shared across report runs. Sums keep full f64 precision -
//! rounding happens once, in the report formatter. Net and profit are
//! always derived (`net = gross + returns`, `profit = sales - cost`), never
//! accumulated independently, so the report identities hold by construction.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::Serialize;

use crate::types::{LineClass, LineItem, SaleRecord};

// =============================================================================
// Money Sums
// =============================================================================

/// Full-precision sales/tax/cost sums for one classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MoneySums {
    pub sales: f64,
    pub tax: f64,
    pub cost: f64,
}

impl MoneySums {
    fn add_line(&mut self, line: &LineItem) {
        self.sales += line.total_price;
        self.tax += line.total_tax;
        self.cost += line.total_cost;
    }

    /// Profit is always derived from the sums, never accumulated.
    pub fn profit(&self) -> f64 {
        self.sales - self.cost
    }

    /// Elementwise sum, used to derive net from gross + returns.
    pub fn plus(&self, other: &MoneySums) -> MoneySums {
        MoneySums {
            sales: self.sales + other.sales,
            tax: self.tax + other.tax,
            cost: self.cost + other.cost,
        }
    }
}

// =============================================================================
// Day Bucket
// =============================================================================

/// Accumulated figures for one local calendar day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayBucket {
    pub gross: MoneySums,
    pub returns: MoneySums,
    /// Sales with at least one gross line on this day.
    pub gross_sale_count: u64,
    /// Sales with at least one line of any classification on this day.
    pub net_sale_count: u64,
}

impl DayBucket {
    /// Net figures for this day: gross + returns (returns are negative).
    pub fn net(&self) -> MoneySums {
        self.gross.plus(&self.returns)
    }
}

// =============================================================================
// Global Totals
// =============================================================================

/// Totals across the whole window, plus diagnostic line counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalTotals {
    pub gross: MoneySums,
    pub returns: MoneySums,
    /// Sum of line discounts across ALL lines, gross and returns alike.
    pub total_discount: f64,
    /// Lines the platform flagged as returns.
    pub return_lines_seen: u64,
    /// Lines with any negative numeric field.
    pub negative_lines_seen: u64,
}

impl GlobalTotals {
    pub fn net(&self) -> MoneySums {
        self.gross.plus(&self.returns)
    }
}

/// Independent sale-level sums, straight from the platform's own totals.
///
/// These deliberately bypass the line-item aggregation: comparing them to
/// the computed net totals surfaces upstream discrepancies instead of
/// silently resolving them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossCheck {
    pub net_sales: f64,
    pub net_tax: f64,
}

/// The full output of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub totals: GlobalTotals,
    /// Day buckets keyed by `YYYY-MM-DD` (or the unknown sentinel), sorted
    /// ascending by key.
    pub days: BTreeMap<String, DayBucket>,
    pub source_totals: CrossCheck,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates filtered sales into global totals and per-day buckets.
///
/// Commutative accumulation only: the result does not depend on the order
/// of `sales` beyond float addition order, and every invocation starts
/// from fresh accumulators.
pub fn aggregate_sales(sales: &[SaleRecord], tz: Tz) -> Aggregation {
    let mut agg = Aggregation::default();

    for sale in sales {
        // Sale-level reported totals feed the cross-check sums whether or
        // not the sale has any lines.
        agg.source_totals.net_sales += sale.total_price;
        agg.source_totals.net_tax += sale.total_tax;

        if sale.line_items.is_empty() {
            continue;
        }

        let day = sale.day_key(tz);
        let bucket = agg.days.entry(day).or_default();
        let mut saw_gross_line = false;

        for line in &sale.line_items {
            // Discount is tracked across every line regardless of class
            agg.totals.total_discount += line.total_discount;

            if line.is_return {
                agg.totals.return_lines_seen += 1;
            }
            if line.is_negative() {
                agg.totals.negative_lines_seen += 1;
            }

            match line.classify() {
                LineClass::Gross => {
                    saw_gross_line = true;
                    bucket.gross.add_line(line);
                    agg.totals.gross.add_line(line);
                }
                LineClass::Returns => {
                    bucket.returns.add_line(line);
                    agg.totals.returns.add_line(line);
                }
            }
        }

        bucket.net_sale_count += 1;
        if saw_gross_line {
            bucket.gross_sale_count += 1;
        }
    }

    agg
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn sale(value: serde_json::Value) -> SaleRecord {
        serde_json::from_value(value).unwrap()
    }

    /// Sale A and Sale B from the reference scenario: one plain sale and
    /// one flagged-and-negative return on the same local day.
    fn scenario_sales() -> Vec<SaleRecord> {
        vec![
            sale(serde_json::json!({
                "id": "sale-a",
                "status": "COMPLETED",
                "state": "closed",
                "sale_date": "2025-08-08T14:00:00Z",
                "total_price": 100.0,
                "total_tax": 8.0,
                "line_items": [{
                    "quantity": 1,
                    "total_price": 100.0,
                    "total_tax": 8.0,
                    "total_cost": 60.0,
                    "total_discount": 0,
                    "is_return": false
                }]
            })),
            sale(serde_json::json!({
                "id": "sale-b",
                "status": "COMPLETED",
                "state": "closed",
                "sale_date": "2025-08-08T16:00:00Z",
                "total_price": -50.0,
                "total_tax": -4.0,
                "line_items": [{
                    "quantity": -1,
                    "total_price": -50.0,
                    "total_tax": -4.0,
                    "total_cost": -30.0,
                    "total_discount": 0,
                    "is_return": true
                }]
            })),
        ]
    }

    #[test]
    fn test_reference_scenario_totals() {
        let agg = aggregate_sales(&scenario_sales(), New_York);

        assert_eq!(agg.totals.gross.sales, 100.0);
        assert_eq!(agg.totals.gross.tax, 8.0);
        assert_eq!(agg.totals.gross.cost, 60.0);
        assert_eq!(agg.totals.gross.profit(), 40.0);

        assert_eq!(agg.totals.returns.sales, -50.0);
        assert_eq!(agg.totals.returns.tax, -4.0);
        assert_eq!(agg.totals.returns.cost, -30.0);
        assert_eq!(agg.totals.returns.profit(), -20.0);

        let net = agg.totals.net();
        assert_eq!(net.sales, 50.0);
        assert_eq!(net.tax, 4.0);
        assert_eq!(net.cost, 30.0);
        assert_eq!(net.profit(), 20.0);

        assert_eq!(agg.totals.return_lines_seen, 1);
        assert_eq!(agg.totals.negative_lines_seen, 1);
    }

    #[test]
    fn test_reference_scenario_single_day_bucket() {
        let agg = aggregate_sales(&scenario_sales(), New_York);

        assert_eq!(agg.days.len(), 1);
        let bucket = &agg.days["2025-08-08"];
        assert_eq!(bucket.gross.sales, 100.0);
        assert_eq!(bucket.returns.sales, -50.0);
        assert_eq!(bucket.net().sales, 50.0);
        assert_eq!(bucket.net().profit(), 20.0);
        // Sale A has a gross line; both sales have lines
        assert_eq!(bucket.gross_sale_count, 1);
        assert_eq!(bucket.net_sale_count, 2);
    }

    #[test]
    fn test_cross_check_sums_use_sale_level_totals() {
        let agg = aggregate_sales(&scenario_sales(), New_York);
        assert_eq!(agg.source_totals.net_sales, 50.0);
        assert_eq!(agg.source_totals.net_tax, 4.0);
    }

    #[test]
    fn test_result_is_order_independent() {
        let forward = aggregate_sales(&scenario_sales(), New_York);
        let mut reversed_input = scenario_sales();
        reversed_input.reverse();
        let reversed = aggregate_sales(&reversed_input, New_York);

        assert_eq!(forward.totals.gross, reversed.totals.gross);
        assert_eq!(forward.totals.returns, reversed.totals.returns);
        assert_eq!(forward.source_totals.net_sales, reversed.source_totals.net_sales);
        assert_eq!(
            forward.days.keys().collect::<Vec<_>>(),
            reversed.days.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_day_bucket_sums_match_global_totals() {
        let sales = vec![
            sale(serde_json::json!({
                "id": "d1", "sale_date": "2025-08-06T12:00:00Z",
                "line_items": [
                    {"quantity": 2, "total_price": 20.0, "total_tax": 1.5, "total_cost": 8.0},
                    {"quantity": -1, "total_price": -5.0, "total_tax": -0.25, "total_cost": -2.0}
                ]
            })),
            sale(serde_json::json!({
                "id": "d2", "sale_date": "2025-08-07T12:00:00Z",
                "line_items": [
                    {"quantity": 1, "total_price": 12.75, "total_tax": 1.0, "total_cost": 6.5}
                ]
            })),
            sale(serde_json::json!({
                "id": "d3", "sale_date": "2025-08-06T18:00:00Z",
                "line_items": [
                    {"quantity": 3, "total_price": 30.0, "total_tax": 2.25, "total_cost": 15.0}
                ]
            })),
        ];
        let agg = aggregate_sales(&sales, New_York);

        let bucket_gross_sales: f64 = agg.days.values().map(|b| b.gross.sales).sum();
        let bucket_returns_sales: f64 = agg.days.values().map(|b| b.returns.sales).sum();
        let bucket_gross_tax: f64 = agg.days.values().map(|b| b.gross.tax).sum();
        let bucket_gross_cost: f64 = agg.days.values().map(|b| b.gross.cost).sum();

        assert_eq!(bucket_gross_sales, agg.totals.gross.sales);
        assert_eq!(bucket_returns_sales, agg.totals.returns.sales);
        assert_eq!(bucket_gross_tax, agg.totals.gross.tax);
        assert_eq!(bucket_gross_cost, agg.totals.gross.cost);
    }

    #[test]
    fn test_missing_sale_date_lands_in_unknown_bucket() {
        let sales = vec![sale(serde_json::json!({
            "id": "no-date",
            "line_items": [{"quantity": 1, "total_price": 10.0, "total_cost": 4.0}]
        }))];
        let agg = aggregate_sales(&sales, New_York);

        assert_eq!(agg.days.len(), 1);
        let bucket = &agg.days[crate::UNKNOWN_DAY_KEY];
        assert_eq!(bucket.gross.sales, 10.0);
        assert_eq!(bucket.net_sale_count, 1);
    }

    #[test]
    fn test_unknown_bucket_sorts_after_date_keys() {
        let sales = vec![
            sale(serde_json::json!({
                "id": "dated", "sale_date": "2025-08-08T12:00:00Z",
                "line_items": [{"quantity": 1, "total_price": 1.0}]
            })),
            sale(serde_json::json!({
                "id": "undated",
                "line_items": [{"quantity": 1, "total_price": 2.0}]
            })),
        ];
        let agg = aggregate_sales(&sales, New_York);
        let keys: Vec<_> = agg.days.keys().cloned().collect();
        assert_eq!(keys, vec!["2025-08-08".to_string(), "unknown".to_string()]);
    }

    #[test]
    fn test_sale_without_lines_only_feeds_cross_check() {
        let sales = vec![sale(serde_json::json!({
            "id": "empty", "sale_date": "2025-08-08T12:00:00Z",
            "total_price": 99.0, "total_tax": 9.0
        }))];
        let agg = aggregate_sales(&sales, New_York);

        assert!(agg.days.is_empty());
        assert_eq!(agg.totals.gross.sales, 0.0);
        assert_eq!(agg.source_totals.net_sales, 99.0);
        assert_eq!(agg.source_totals.net_tax, 9.0);
    }

    #[test]
    fn test_discount_accumulates_for_both_classes() {
        let sales = vec![sale(serde_json::json!({
            "id": "disc", "sale_date": "2025-08-08T12:00:00Z",
            "line_items": [
                {"quantity": 1, "total_price": 10.0, "total_discount": 1.5},
                {"quantity": -1, "total_price": -10.0, "total_discount": 0.5, "is_return": true}
            ]
        }))];
        let agg = aggregate_sales(&sales, New_York);
        assert_eq!(agg.totals.total_discount, 2.0);
    }

    #[test]
    fn test_return_flagged_positive_line_counts_once() {
        // Flagged as return but all-positive: return counter increments,
        // negative counter does not, and the line lands in returns.
        let sales = vec![sale(serde_json::json!({
            "id": "flag", "sale_date": "2025-08-08T12:00:00Z",
            "line_items": [{"quantity": 1, "total_price": 25.0, "is_return": true}]
        }))];
        let agg = aggregate_sales(&sales, New_York);

        assert_eq!(agg.totals.return_lines_seen, 1);
        assert_eq!(agg.totals.negative_lines_seen, 0);
        assert_eq!(agg.totals.returns.sales, 25.0);
        assert_eq!(agg.totals.gross.sales, 0.0);
        // A returns-only sale counts toward net sales count, not gross
        let bucket = &agg.days["2025-08-08"];
        assert_eq!(bucket.gross_sale_count, 0);
        assert_eq!(bucket.net_sale_count, 1);
    }
}
