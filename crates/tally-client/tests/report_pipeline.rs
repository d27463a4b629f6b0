//! End-to-end pipeline test: canned search pages through pagination,
//! dedup, filtering, aggregation, and report assembly - everything except
//! the actual network.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;

use tally_client::{paginate, ClientResult, PageOutcome};
use tally_core::report::process_sales;
use tally_core::{PeriodParams, ReportPeriod, SaleRecord};

fn sale(value: serde_json::Value) -> SaleRecord {
    serde_json::from_value(value).unwrap()
}

/// Two reportable sales (one plain, one return), a voided sale, and a
/// duplicate across a page boundary.
fn canned_pages() -> Vec<ClientResult<PageOutcome>> {
    let sale_a = serde_json::json!({
        "id": "sale-a", "status": "COMPLETED", "state": "closed",
        "sale_date": "2025-08-08T14:00:00Z",
        "total_price": 100.0, "total_tax": 8.0,
        "line_items": [{
            "quantity": 1, "total_price": 100.0, "total_tax": 8.0,
            "total_cost": 60.0, "total_discount": 0, "is_return": false
        }]
    });
    let sale_b = serde_json::json!({
        "id": "sale-b", "status": "COMPLETED", "state": "closed",
        "sale_date": "2025-08-08T16:00:00Z",
        "total_price": -50.0, "total_tax": -4.0,
        "line_items": [{
            "quantity": -1, "total_price": -50.0, "total_tax": -4.0,
            "total_cost": -30.0, "total_discount": 0, "is_return": true
        }]
    });
    let sale_voided = serde_json::json!({
        "id": "sale-v", "status": "VOIDED", "state": "voided",
        "sale_date": "2025-08-08T17:00:00Z",
        "total_price": 500.0, "total_tax": 50.0,
        "line_items": [{"quantity": 1, "total_price": 500.0, "total_cost": 100.0}]
    });

    vec![
        Ok(PageOutcome::Page {
            sales: vec![sale(sale_a.clone()), sale(sale_voided)],
            url: "https://api.test/search?offset=0".to_string(),
        }),
        // Rate limited mid-fetch: retried, not fatal, no data lost
        Ok(PageOutcome::RateLimited {
            retry_after: Some(Duration::from_secs(1)),
            url: "https://api.test/search?offset=2".to_string(),
        }),
        // The boundary record sale-a appears again on the second page
        Ok(PageOutcome::Page {
            sales: vec![sale(sale_a), sale(sale_b)],
            url: "https://api.test/search?offset=2".to_string(),
        }),
        // Full final page, so one more (empty) request signals the end
        Ok(PageOutcome::Page {
            sales: vec![],
            url: "https://api.test/search?offset=4".to_string(),
        }),
    ]
}

#[tokio::test(start_paused = true)]
async fn full_pipeline_produces_reference_report() {
    let mut responses: VecDeque<_> = canned_pages().into_iter().collect();
    let fetched = paginate(
        |_offset| {
            let next = responses.pop_front().expect("script ran dry");
            async move { next }
        },
        2,
        1000,
    )
    .await
    .expect("fetch should succeed");

    assert_eq!(fetched.items.len(), 4);
    assert_eq!(fetched.request_urls.len(), 4);

    let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2025-08-20T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let window = ReportPeriod::new(
        "daily",
        PeriodParams {
            date: Some("2025-08-08".into()),
            ..PeriodParams::default()
        },
    )
    .unwrap()
    .resolve(New_York, now)
    .unwrap();

    let report = process_sales(&window, fetched.items, fetched.request_urls);

    // Raw 4 records, 3 after dedup, 2 after dropping the voided sale
    assert_eq!(report.records.raw, 4);
    assert_eq!(report.records.deduplicated, 3);
    assert_eq!(report.records.filtered, 2);

    // Reference totals
    assert_eq!(report.totals.gross.sales, 100.0);
    assert_eq!(report.totals.gross.tax, 8.0);
    assert_eq!(report.totals.gross.cost, 60.0);
    assert_eq!(report.totals.gross.profit, 40.0);
    assert_eq!(report.totals.returns.sales, -50.0);
    assert_eq!(report.totals.returns.tax, -4.0);
    assert_eq!(report.totals.returns.cost, -30.0);
    assert_eq!(report.totals.returns.profit, -20.0);
    assert_eq!(report.totals.net.sales, 50.0);
    assert_eq!(report.totals.net.tax, 4.0);
    assert_eq!(report.totals.net.cost, 30.0);
    assert_eq!(report.totals.net.profit, 20.0);
    assert_eq!(report.totals.return_lines_seen, 1);
    assert_eq!(report.totals.negative_lines_seen, 1);

    // The voided sale is gone from everything, cross-checks included
    assert_eq!(report.source_totals.net_sales, 50.0);
    assert_eq!(report.source_totals.net_tax, 4.0);
    assert_eq!(report.status_counts["VOIDED"], 1);

    // Single day bucket with both sales
    assert_eq!(report.days.len(), 1);
    let day = &report.days["2025-08-08"];
    assert_eq!(day.net.sales, 50.0);
    assert_eq!(day.gross_sale_count, 1);
    assert_eq!(day.net_sale_count, 2);

    // Net identities hold in every bucket
    for day in report.days.values() {
        assert_eq!(day.net.sales, day.gross.sales + day.returns.sales);
        assert_eq!(day.net.tax, day.gross.tax + day.returns.tax);
        assert_eq!(day.net.cost, day.gross.cost + day.returns.cost);
        assert_eq!(day.net.profit, day.net.sales - day.net.cost);
    }

    // Audit trail is carried through verbatim
    assert_eq!(report.request_urls.len(), 4);
}
