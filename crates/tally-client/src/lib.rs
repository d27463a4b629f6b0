//! # tally-client: Retail Platform API Client
//!
//! This crate owns every call the back office makes to the retail
//! platform's HTTP API, and glues the fetched data into the pure report
//! pipeline in `tally-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       tally-client                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  RetailClient  │  │   Pagination   │  │   ReportService        │    │
//! │  │  (http.rs)     │  │  (search.rs)   │  │   (service.rs)         │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Authenticated  │  │ Offset cursor  │  │ window ► fetch ►       │    │
//! │  │ reqwest session│◄─│ 429 backoff    │◄─│ process_sales          │    │
//! │  │ bearer token   │  │ page limits    │  │ error objects          │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │   Webhooks     │  │    Config      │                                │
//! │  │ (webhooks.rs)  │  │  (config.rs)   │                                │
//! │  │                │  │                │                                │
//! │  │ Idempotent     │  │ Env vars with  │                                │
//! │  │ ensure/list    │  │ defaults       │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Client error types and their pipeline mapping
//! - [`http`] - Authenticated HTTP session
//! - [`search`] - Paginated sales fetch with rate-limit backoff
//! - [`service`] - The `generate_report` boundary
//! - [`webhooks`] - Webhook subscription management

pub mod config;
pub mod error;
pub mod http;
pub mod search;
pub mod service;
pub mod webhooks;

pub use config::{ConfigError, RetailConfig};
pub use error::{ClientError, ClientResult};
pub use http::RetailClient;
pub use search::{paginate, FetchResult, PageOutcome};
pub use service::ReportService;
pub use webhooks::Webhook;
