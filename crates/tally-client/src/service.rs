//! # Report Service
//!
//! Glues the fetch to the pure pipeline: resolve the window, pull every
//! page, hand the records to tally-core, and convert any failure into the
//! uniform caller-facing error object.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period + params                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve window (tally-core) ── InvalidPeriod ──► ErrorResponse (400)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch_sales (this crate) ───── UpstreamError ──► ErrorResponse         │
//! │       │                                           (upstream status)     │
//! │       ▼                                                                 │
//! │  process_sales (tally-core) ──► SalesReport                             │
//! │                                                                         │
//! │  Every run allocates fresh accumulators; concurrent reports share       │
//! │  nothing but the HTTP connection pool.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, error, info};

use tally_core::report::process_sales;
use tally_core::{ErrorResponse, PeriodParams, ReportPeriod, ReportResult, SalesReport};

use crate::config::RetailConfig;
use crate::http::RetailClient;

/// Generates sales reports against the retail platform.
#[derive(Debug, Clone)]
pub struct ReportService {
    client: RetailClient,
    timezone: Tz,
    page_size: usize,
    max_pages: usize,
}

impl ReportService {
    /// Creates a service from a client and its configuration.
    pub fn new(client: RetailClient, config: &RetailConfig) -> Self {
        ReportService {
            client,
            timezone: config.timezone,
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }

    /// Generates a report for a period kind ("daily", "weekly",
    /// "monthly") and its parameters.
    ///
    /// This is the boundary the views call: the result is either the
    /// report object or the uniform `{"error", "status_code"}` object -
    /// no error type ever crosses it raw.
    pub async fn generate_report(
        &self,
        kind: &str,
        params: PeriodParams,
    ) -> Result<SalesReport, ErrorResponse> {
        self.try_generate(kind, params).await.map_err(|err| {
            error!(%err, "Report generation failed");
            ErrorResponse::from(err)
        })
    }

    /// Daily report for a `YYYY-MM-DD` date, default today.
    pub async fn daily_report(
        &self,
        date: Option<String>,
    ) -> Result<SalesReport, ErrorResponse> {
        self.generate_report(
            "daily",
            PeriodParams {
                date,
                ..PeriodParams::default()
            },
        )
        .await
    }

    /// Weekly report from a `YYYY-MM-DD` start date, default the Monday
    /// of the current week.
    pub async fn weekly_report(
        &self,
        start_date: Option<String>,
    ) -> Result<SalesReport, ErrorResponse> {
        self.generate_report(
            "weekly",
            PeriodParams {
                start_date,
                ..PeriodParams::default()
            },
        )
        .await
    }

    /// Monthly report, default the current month.
    pub async fn monthly_report(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<SalesReport, ErrorResponse> {
        self.generate_report(
            "monthly",
            PeriodParams {
                year,
                month,
                ..PeriodParams::default()
            },
        )
        .await
    }

    async fn try_generate(&self, kind: &str, params: PeriodParams) -> ReportResult<SalesReport> {
        let period = ReportPeriod::new(kind, params)?;
        let window = period.resolve(self.timezone, Utc::now())?;

        info!(
            period = %window.kind,
            date_from = %window.date_from(),
            date_to = %window.date_to(),
            timezone = %self.timezone,
            "Generating sales report"
        );

        let fetched = self
            .client
            .fetch_sales(&window, self.page_size, self.max_pages)
            .await?;

        info!(
            records = fetched.items.len(),
            requests = fetched.request_urls.len(),
            "Fetch complete"
        );
        debug!(urls = ?fetched.request_urls, "Requests issued");

        Ok(process_sales(&window, fetched.items, fetched.request_urls))
    }
}
