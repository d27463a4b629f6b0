//! # Sale Deduplication and Filtering
//!
//! Decides which fetched sales are kept for financial reporting.
//!
//! ## Pipeline Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   raw pages ──► dedupe by sale id ──► business-rule filter ──► kept     │
//! │                 (last seen wins)       (drop on first match)            │
//! │                                                                         │
//! │   Rule 1  status is SAVED or VOIDED                 ──► drop            │
//! │   Rule 2  status ONACCOUNT_CLOSED, state != closed  ──► drop            │
//! │   Rule 3  state is voided                           ──► drop            │
//! │   otherwise                                         ──► keep            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both steps are pure and deterministic: the same sale always gets the
//! same decision, and dedup preserves first-seen position so downstream
//! accumulation sees a stable ordering.

use std::collections::{hash_map::Entry, HashMap};

use crate::types::SaleRecord;

// =============================================================================
// Status / State Vocabulary
// =============================================================================

/// Draft sale, parked at the register but never completed.
pub const STATUS_SAVED: &str = "SAVED";
/// Cancelled sale.
pub const STATUS_VOIDED: &str = "VOIDED";
/// On-account sale the platform reports as settled.
pub const STATUS_ON_ACCOUNT_CLOSED: &str = "ONACCOUNT_CLOSED";

/// Lifecycle state of a settled sale.
pub const STATE_CLOSED: &str = "closed";
/// Lifecycle state of a cancelled sale.
pub const STATE_VOIDED: &str = "voided";

// =============================================================================
// Deduplication
// =============================================================================

/// Collapses duplicate sale ids, keeping the last record seen for each id.
///
/// Pages from the platform can overlap at the cursor boundary, so the same
/// sale may arrive twice; duplicate payloads are assumed identical, the
/// last-wins choice just makes the outcome well-defined. First-seen
/// positions are preserved.
pub fn dedupe_sales(sales: Vec<SaleRecord>) -> Vec<SaleRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(sales.len());
    let mut out: Vec<SaleRecord> = Vec::with_capacity(sales.len());

    for sale in sales {
        match index.entry(sale.id.clone()) {
            Entry::Occupied(slot) => out[*slot.get()] = sale,
            Entry::Vacant(slot) => {
                slot.insert(out.len());
                out.push(sale);
            }
        }
    }

    out
}

// =============================================================================
// Business-Rule Filter
// =============================================================================

/// Keep/drop decision for a single deduplicated sale.
///
/// Rules are applied in order; the first matching rule drops the sale and
/// no further rules are evaluated. Comparisons are case-insensitive since
/// the platform is not consistent about casing.
pub fn is_reportable(sale: &SaleRecord) -> bool {
    let status = normalized(sale.status.as_deref());
    let state = normalized(sale.state.as_deref());

    // Rule 1: drafts and voided sales never count
    if status == STATUS_SAVED || status == STATUS_VOIDED {
        return false;
    }

    // Rule 2: an on-account sale reported closed whose state disagrees is
    // inconsistent upstream data; exclude it rather than guess
    if status == STATUS_ON_ACCOUNT_CLOSED && !state.eq_ignore_ascii_case(STATE_CLOSED) {
        return false;
    }

    // Rule 3: voided state drops the sale regardless of status
    if state.eq_ignore_ascii_case(STATE_VOIDED) {
        return false;
    }

    true
}

/// Applies [`is_reportable`] to a deduplicated sale list.
pub fn filter_sales(sales: Vec<SaleRecord>) -> Vec<SaleRecord> {
    sales.into_iter().filter(is_reportable).collect()
}

fn normalized(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_ascii_uppercase()
}

// =============================================================================
// Unit Tests
// =============================================================================
