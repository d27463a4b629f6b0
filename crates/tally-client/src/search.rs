//! # Paginated Sales Search
//!
//! Fetches every sale overlapping a UTC window from the platform's search
//! endpoint.
//!
//! ## Pagination Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Search Pagination                                  │
//! │                                                                         │
//! │  offset = 0                                                             │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  GET search?type=sales&date_from&date_to&offset&page_size               │
//! │     │                                                                   │
//! │     ├── 429 ──► wait Retry-After (or 5s fallback), retry SAME offset    │
//! │     │           not counted as a page; budget-limited                   │
//! │     │                                                                   │
//! │     ├── other non-2xx ──► abort the whole fetch (no partial report)     │
//! │     │                                                                   │
//! │     └── 2xx {"data": [...]} ──► offset += records returned              │
//! │           short page (fewer than page_size) ──► done                    │
//! │           page-count safety limit reached   ──► done (warn)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop itself is generic over the page source so it can be driven by
//! canned pages in tests; [`RetailClient::fetch_sales`] plugs in the real
//! HTTP call.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use tally_core::{ReportWindow, SaleRecord};

use crate::error::{ClientError, ClientResult};
use crate::http::{RetailClient, RATE_LIMITED};

// =============================================================================
// Constants
// =============================================================================

/// Wait applied when a 429 carries no usable `Retry-After` hint.
pub const RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(5);

/// Consecutive 429s tolerated at one offset before the fetch gives up.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 10;

// =============================================================================
// Page Outcomes
// =============================================================================

/// What one search request produced.
#[derive(Debug)]
pub enum PageOutcome {
    /// A successful page of records.
    Page { sales: Vec<SaleRecord>, url: String },
    /// The platform asked us to slow down.
    RateLimited {
        retry_after: Option<Duration>,
        url: String,
    },
}

/// Everything a completed fetch produced.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// All records, in page order. May contain duplicates at page
    /// boundaries; dedup happens in the pipeline.
    pub items: Vec<SaleRecord>,
    /// Every request URL issued, including rate-limited attempts.
    pub request_urls: Vec<String>,
    /// Status of the final upstream response.
    pub status: u16,
}

/// Wire shape of the search endpoint's reply.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SaleRecord>,
}

// =============================================================================
// Pagination Loop
// =============================================================================

/// Drives a page source until the window is exhausted.
///
/// Read-only and side-effect free beyond the requests themselves, so a
/// failed fetch is safe to retry from scratch. Any error aborts the fetch
/// and discards partial results - the caller gets an error, never a
/// truncated report.
pub async fn paginate<F, Fut>(
    mut fetch_page: F,
    page_size: usize,
    max_pages: usize,
) -> ClientResult<FetchResult>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = ClientResult<PageOutcome>>,
{
    let mut result = FetchResult {
        status: 200,
        ..FetchResult::default()
    };
    let mut offset = 0usize;
    let mut pages = 0usize;
    let mut rate_limit_retries = 0u32;

    loop {
        match fetch_page(offset).await? {
            PageOutcome::RateLimited { retry_after, url } => {
                result.request_urls.push(url);
                rate_limit_retries += 1;
                if rate_limit_retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ClientError::RetryBudgetExhausted {
                        retries: rate_limit_retries - 1,
                        offset,
                    });
                }
                let wait = retry_after.unwrap_or(RATE_LIMIT_FALLBACK);
                warn!(
                    offset,
                    attempt = rate_limit_retries,
                    wait_secs = wait.as_secs_f64(),
                    "Rate limited - backing off and retrying the same offset"
                );
                tokio::time::sleep(wait).await;
                // The offset is not advanced and the page is not counted.
            }
            PageOutcome::Page { sales, url } => {
                rate_limit_retries = 0;
                result.request_urls.push(url);
                pages += 1;
                let count = sales.len();
                result.items.extend(sales);
                offset += count;

                debug!(page = pages, offset, count, "Fetched sales page");

                if count < page_size {
                    break;
                }
                if pages >= max_pages {
                    warn!(
                        pages,
                        fetched = result.items.len(),
                        "Page safety limit reached - stopping pagination"
                    );
                    break;
                }
            }
        }
    }

    Ok(result)
}

/// Parses a `Retry-After` header value: either delay seconds or an
/// RFC1123 HTTP date. Unparsable values yield `None` (the caller applies
/// the fixed fallback).
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(when) = DateTime::parse_from_rfc2822(raw) {
        // A date in the past means "retry now", not an error
        return Some(
            (when.with_timezone(&Utc) - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        );
    }
    None
}

// =============================================================================
// HTTP Page Source
// =============================================================================

impl RetailClient {
    /// Issues one search request for the given offset.
    pub(crate) async fn search_sales_page(
        &self,
        date_from: &str,
        date_to: &str,
        offset: usize,
        page_size: usize,
    ) -> ClientResult<PageOutcome> {
        let offset_param = offset.to_string();
        let page_size_param = page_size.to_string();
        let response = self
            .get_raw(
                "search",
                &[
                    ("type", "sales"),
                    ("date_from", date_from),
                    ("date_to", date_to),
                    ("offset", offset_param.as_str()),
                    ("page_size", page_size_param.as_str()),
                ],
            )
            .await?;

        let url = response.url().to_string();
        let status = response.status();

        if status == RATE_LIMITED {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|raw| parse_retry_after(raw, Utc::now()));
            return Ok(PageOutcome::RateLimited { retry_after, url });
        }

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| ClientError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Ok(PageOutcome::Page {
            sales: body.data,
            url,
        })
    }

    /// Fetches every sale overlapping the window.
    pub async fn fetch_sales(
        &self,
        window: &ReportWindow,
        page_size: usize,
        max_pages: usize,
    ) -> ClientResult<FetchResult> {
        let date_from = window.date_from();
        let date_to = window.date_to();
        debug!(%date_from, %date_to, page_size, "Starting sales fetch");

        paginate(
            |offset| self.search_sales_page(&date_from, &date_to, offset, page_size),
            page_size,
            max_pages,
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
