//! # tally-core: Pure Report Pipeline for Tally POS
//!
//! This crate is the **heart** of the back office. It turns a reporting
//! period plus a batch of raw sale records fetched from the retail platform
//! into a finished multi-dimensional sales report, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tally Back Office Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/back-office (axum views)                  │   │
//! │  │    /reports/sales/daily ── /weekly ── /monthly ── /health       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tally-client (retail platform API)               │   │
//! │  │    paginated search fetch, 429 backoff, webhook management      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ tally-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  window   │  │  filter   │  │ aggregate │  │  report   │  │   │
//! │  │   │  periods  │  │  dedup +  │  │  buckets  │  │  assembly │  │   │
//! │  │   │  UTC range│  │  rules    │  │  totals   │  │  rounding │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Upstream sale record shapes and lenient parsing
//! - [`window`] - Reporting period to UTC half-open interval resolution
//! - [`filter`] - Deduplication and business-rule filtering
//! - [`aggregate`] - Gross/returns/net accumulation into day buckets
//! - [`report`] - Final report assembly, rounding, diagnostics
//! - [`error`] - Pipeline error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the pipeline is a function of (period, now, sales)
//! 2. **No I/O**: fetching lives in tally-client, never here
//! 3. **Full-Precision Accumulation**: monetary sums stay unrounded until
//!    report assembly, then round to 2 decimals exactly once
//! 4. **Lenient Inputs**: malformed upstream records are coerced, never fatal

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod report;
pub mod types;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::SalesReport` instead of
// `use tally_core::report::SalesReport`

pub use aggregate::{aggregate_sales, Aggregation};
pub use error::{ErrorResponse, ReportError, ReportResult};
pub use filter::{dedupe_sales, filter_sales, is_reportable};
pub use report::{process_sales, SalesReport};
pub use types::{LineItem, SaleRecord};
pub use window::{PeriodKind, PeriodParams, ReportPeriod, ReportWindow};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default reporting time zone when none is configured.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Day-bucket key for sales whose timestamp is missing or unparsable.
///
/// Such sales are still aggregated (their money is real), they just cannot
/// be attributed to a calendar day. Sorts after every `YYYY-MM-DD` key.
pub const UNKNOWN_DAY_KEY: &str = "unknown";
