//! # Report Assembly
//!
//! Shapes one aggregation run into the final report object: parameter
//! echo, record counts, diagnostic histograms, rounded totals, sorted day
//! buckets, cross-check sums, and the fixed caveats describing the
//! conventions applied.
//!
//! This is the only place monetary values are rounded. Everything upstream
//! of this module works in full precision.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{aggregate_sales, Aggregation, DayBucket, MoneySums};
use crate::filter::{dedupe_sales, filter_sales};
use crate::types::SaleRecord;
use crate::window::{PeriodKind, ReportWindow, ResolvedParams};

// =============================================================================
// Output Shapes
// =============================================================================

/// One rounded gross/returns/net metrics block.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MetricsOut {
    pub sales: f64,
    pub tax: f64,
    pub cost: f64,
    pub profit: f64,
}

impl MetricsOut {
    fn from_sums(sums: &MoneySums) -> Self {
        MetricsOut {
            sales: round2(sums.sales),
            tax: round2(sums.tax),
            cost: round2(sums.cost),
            profit: round2(sums.profit()),
        }
    }
}

/// Rounded totals block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct TotalsOut {
    pub gross: MetricsOut,
    pub returns: MetricsOut,
    pub net: MetricsOut,
    pub total_discount: f64,
    pub return_lines_seen: u64,
    pub negative_lines_seen: u64,
}

/// Rounded per-day block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct DayOut {
    pub gross: MetricsOut,
    pub returns: MetricsOut,
    pub net: MetricsOut,
    pub gross_sale_count: u64,
    pub net_sale_count: u64,
}

impl DayOut {
    fn from_bucket(bucket: &DayBucket) -> Self {
        DayOut {
            gross: MetricsOut::from_sums(&bucket.gross),
            returns: MetricsOut::from_sums(&bucket.returns),
            net: MetricsOut::from_sums(&bucket.net()),
            gross_sale_count: bucket.gross_sale_count,
            net_sale_count: bucket.net_sale_count,
        }
    }
}

/// Raw / deduplicated / filtered record counts.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RecordCounts {
    pub raw: usize,
    pub deduplicated: usize,
    pub filtered: usize,
}

/// Rounded sale-level cross-check sums.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SourceTotalsOut {
    pub net_sales: f64,
    pub net_tax: f64,
}

/// Parameter echo: the resolved period inputs plus the UTC range queried.
#[derive(Debug, Clone, Serialize)]
pub struct ParametersOut {
    #[serde(flatten)]
    pub resolved: ResolvedParams,
    pub date_from: String,
    pub date_to: String,
}

/// The finished sales report.
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub period: PeriodKind,
    pub timezone: String,
    pub parameters: ParametersOut,
    pub records: RecordCounts,
    /// Status distribution over the deduplicated set (diagnostics).
    pub status_counts: BTreeMap<String, u64>,
    /// State distribution over the deduplicated set (diagnostics).
    pub state_counts: BTreeMap<String, u64>,
    pub totals: TotalsOut,
    /// Day buckets sorted ascending by date key; the unknown sentinel
    /// sorts last.
    pub days: BTreeMap<String, DayOut>,
    /// Sale-level sums reported by the platform, for reconciliation
    /// against the computed net totals.
    pub source_totals: SourceTotalsOut,
    /// Every request URL the fetch issued, for audit.
    pub request_urls: Vec<String>,
    /// Fixed description of the conventions this report applies.
    pub caveats: Vec<&'static str>,
}

// =============================================================================
// Assembly
// =============================================================================

/// The full post-fetch pipeline: dedupe, filter, aggregate, format.
///
/// Pure: given the same window, records, and URLs this always produces the
/// same report.
pub fn process_sales(
    window: &ReportWindow,
    raw_sales: Vec<SaleRecord>,
    request_urls: Vec<String>,
) -> SalesReport {
    let raw = raw_sales.len();

    let deduplicated = dedupe_sales(raw_sales);
    let status_counts = histogram(deduplicated.iter().map(|s| s.status.as_deref()));
    let state_counts = histogram(deduplicated.iter().map(|s| s.state.as_deref()));
    let deduplicated_count = deduplicated.len();

    let filtered = filter_sales(deduplicated);
    let filtered_count = filtered.len();

    let aggregation = aggregate_sales(&filtered, window.timezone);

    build_report(
        window,
        RecordCounts {
            raw,
            deduplicated: deduplicated_count,
            filtered: filtered_count,
        },
        status_counts,
        state_counts,
        aggregation,
        request_urls,
    )
}

/// Formats one aggregation run into the report object.
pub fn build_report(
    window: &ReportWindow,
    records: RecordCounts,
    status_counts: BTreeMap<String, u64>,
    state_counts: BTreeMap<String, u64>,
    aggregation: Aggregation,
    request_urls: Vec<String>,
) -> SalesReport {
    let Aggregation {
        totals,
        days,
        source_totals,
    } = aggregation;

    SalesReport {
        period: window.kind,
        timezone: window.timezone.name().to_string(),
        parameters: ParametersOut {
            resolved: window.echo.clone(),
            date_from: window.date_from(),
            date_to: window.date_to(),
        },
        records,
        status_counts,
        state_counts,
        totals: TotalsOut {
            gross: MetricsOut::from_sums(&totals.gross),
            returns: MetricsOut::from_sums(&totals.returns),
            net: MetricsOut::from_sums(&totals.net()),
            total_discount: round2(totals.total_discount),
            return_lines_seen: totals.return_lines_seen,
            negative_lines_seen: totals.negative_lines_seen,
        },
        days: days
            .iter()
            .map(|(key, bucket)| (key.clone(), DayOut::from_bucket(bucket)))
            .collect(),
        source_totals: SourceTotalsOut {
            net_sales: round2(source_totals.net_sales),
            net_tax: round2(source_totals.net_tax),
        },
        request_urls,
        caveats: CAVEATS.to_vec(),
    }
}

/// The conventions every report applies, spelled out for the reader.
const CAVEATS: &[&str] = &[
    "Saved (draft) and voided sales are excluded, as are on-account sales reported closed whose state is not closed.",
    "A line item counts as a return when it is flagged as a return or when any of its quantity, price, tax, or cost is negative; all other lines count as gross.",
    "Returns are negative-valued; net figures are gross + returns.",
    "Profit is sales minus cost at every level.",
    "source_totals are the platform's own sale-level sums and may disagree with the line-level aggregation; the difference is reported, not reconciled.",
    "Sales with a missing or unparsable timestamp are aggregated under the 'unknown' day.",
];

// =============================================================================
// Helpers
// =============================================================================

/// Rounds to 2 decimal places. Applied exactly once, at output time.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn histogram<'a>(values: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for value in values {
        let key = match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => "unknown".to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Unit Tests
// =============================================================================
