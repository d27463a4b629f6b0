//! # Upstream Sale Types
//!
//! Shapes of the records returned by the retail platform's paginated search
//! endpoint, plus the lenient parsing that keeps bad upstream data from
//! aborting a report.
//!
//! ## Leniency Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Upstream data quality is outside this system's control.                │
//! │                                                                         │
//! │  amount fields    number | "12.34" | null | missing  ──►  f64 (0.0)     │
//! │  return flag      bool | null | missing               ──►  bool (false) │
//! │  sale_date        RFC3339 | naive (assumed UTC) | bad ──►  Option       │
//! │                                                                         │
//! │  A malformed record NEVER raises - it is coerced and reporting          │
//! │  continues. Only pipeline-level failures abort a report.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::UNKNOWN_DAY_KEY;

// =============================================================================
// Sale Record
// =============================================================================

/// A raw sale as returned by the platform's search endpoint.
///
/// Only the fields the report pipeline consumes are modeled; everything else
/// in the upstream payload is ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Upstream sale identifier. Deduplication key.
    #[serde(default)]
    pub id: String,

    /// Upstream status string (e.g. "CLOSED", "SAVED", "VOIDED",
    /// "ONACCOUNT", "ONACCOUNT_CLOSED"). Kept raw for the diagnostic
    /// histograms; the filter compares case-insensitively.
    #[serde(default)]
    pub status: Option<String>,

    /// Upstream lifecycle state string ("pending", "closed", "voided").
    #[serde(default)]
    pub state: Option<String>,

    /// Sale timestamp, ISO-8601. Assumed UTC when no offset is given.
    #[serde(default)]
    pub sale_date: Option<String>,

    /// Sale-level total price as reported by the platform.
    /// Feeds the cross-check sums, not the line-level aggregation.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_price: f64,

    /// Sale-level total tax as reported by the platform.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_tax: f64,

    /// Ordered line items of the sale.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl SaleRecord {
    /// Parses the sale timestamp, if present and well-formed.
    ///
    /// Accepts RFC3339 (with offset or `Z`) and naive `YYYY-MM-DDTHH:MM:SS`
    /// / `YYYY-MM-DD HH:MM:SS` forms, which are taken to be UTC.
    pub fn parsed_sale_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.sale_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        None
    }

    /// Day-bucket key for this sale: the local calendar date of its
    /// timestamp in the reporting zone, or [`UNKNOWN_DAY_KEY`] when the
    /// timestamp is missing or unparsable.
    pub fn day_key(&self, tz: Tz) -> String {
        match self.parsed_sale_date() {
            Some(dt) => dt.with_timezone(&tz).format("%Y-%m-%d").to_string(),
            None => UNKNOWN_DAY_KEY.to_string(),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A single line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Quantity sold. Negative on return lines.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub quantity: f64,

    /// Line total price.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_price: f64,

    /// Line total tax.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_tax: f64,

    /// Line total cost (for profit).
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_cost: f64,

    /// Line total discount.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_discount: f64,

    /// Whether the platform flagged this line as a return.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_return: bool,
}

/// How a line item is counted in the report.
///
/// The two classes are mutually exclusive and exhaustive: a line is either
/// gross or returns, never both, never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Not negative and not flagged as a return.
    Gross,
    /// Flagged as a return, or any numeric field negative.
    Returns,
}

impl LineItem {
    /// A line is negative if any of quantity, price, tax, or cost is
    /// negative.
    pub fn is_negative(&self) -> bool {
        self.quantity < 0.0
            || self.total_price < 0.0
            || self.total_tax < 0.0
            || self.total_cost < 0.0
    }

    /// Classifies this line as gross or returns.
    pub fn classify(&self) -> LineClass {
        if self.is_return || self.is_negative() {
            LineClass::Returns
        } else {
            LineClass::Gross
        }
    }
}

// =============================================================================
// Lenient Deserializers
// =============================================================================

/// Custom deserializers that coerce sloppy upstream values instead of
/// failing the whole page.
pub(crate) mod lenient {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    /// Deserializes an amount that may arrive as a number, a numeric
    /// string, null, or not at all. Anything unusable becomes `0.0`.
    pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = f64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number, numeric string, or null")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(if v.is_finite() { v } else { 0.0 })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                Ok(v.trim().parse::<f64>().ok().filter(|x| x.is_finite()).unwrap_or(0.0))
            }

            fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
                Ok(0.0)
            }

            fn visit_none<E: de::Error>(self) -> Result<f64, E> {
                Ok(0.0)
            }

            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<f64, D2::Error> {
                d.deserialize_any(AmountVisitor)
            }

            fn visit_bool<E: de::Error>(self, _v: bool) -> Result<f64, E> {
                Ok(0.0)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }

    /// Deserializes a boolean flag, treating null/missing as false.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::Deserialize;
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn sale_json(value: serde_json::Value) -> SaleRecord {
        serde_json::from_value(value).expect("sale should deserialize")
    }

    #[test]
    fn test_amounts_accept_numbers_strings_and_null() {
        let sale = sale_json(serde_json::json!({
            "id": "s1",
            "total_price": "100.50",
            "total_tax": 8,
            "line_items": [
                {"quantity": 1, "total_price": null, "total_cost": "not a number"}
            ]
        }));
        assert_eq!(sale.total_price, 100.50);
        assert_eq!(sale.total_tax, 8.0);
        assert_eq!(sale.line_items[0].total_price, 0.0);
        assert_eq!(sale.line_items[0].total_cost, 0.0);
        assert_eq!(sale.line_items[0].total_discount, 0.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let sale = sale_json(serde_json::json!({"id": "s2"}));
        assert_eq!(sale.total_price, 0.0);
        assert!(sale.line_items.is_empty());
        assert!(sale.status.is_none());
        assert!(sale.sale_date.is_none());
    }

    #[test]
    fn test_return_flag_null_is_false() {
        let sale = sale_json(serde_json::json!({
            "id": "s3",
            "line_items": [{"quantity": 1, "is_return": null}]
        }));
        assert!(!sale.line_items[0].is_return);
    }

    #[test]
    fn test_sale_date_parsing_variants() {
        let mk = |raw: &str| SaleRecord {
            sale_date: Some(raw.to_string()),
            ..sale_json(serde_json::json!({"id": "x"}))
        };

        assert!(mk("2025-08-08T14:30:00Z").parsed_sale_date().is_some());
        assert!(mk("2025-08-08T14:30:00-04:00").parsed_sale_date().is_some());
        // Naive timestamps are assumed UTC
        let naive = mk("2025-08-08T14:30:00").parsed_sale_date().unwrap();
        let explicit = mk("2025-08-08T14:30:00Z").parsed_sale_date().unwrap();
        assert_eq!(naive, explicit);
        assert!(mk("2025-08-08 14:30:00").parsed_sale_date().is_some());
        assert!(mk("last tuesday").parsed_sale_date().is_none());
        assert!(mk("").parsed_sale_date().is_none());
    }

    #[test]
    fn test_day_key_converts_to_reporting_zone() {
        // 02:30 UTC on Aug 9 is still Aug 8 in New York (UTC-4 in August)
        let sale = SaleRecord {
            sale_date: Some("2025-08-09T02:30:00Z".to_string()),
            ..sale_json(serde_json::json!({"id": "x"}))
        };
        assert_eq!(sale.day_key(New_York), "2025-08-08");
    }

    #[test]
    fn test_day_key_unknown_on_missing_or_bad_date() {
        let missing = sale_json(serde_json::json!({"id": "x"}));
        assert_eq!(missing.day_key(New_York), UNKNOWN_DAY_KEY);

        let bad = SaleRecord {
            sale_date: Some("not-a-date".to_string()),
            ..missing
        };
        assert_eq!(bad.day_key(New_York), UNKNOWN_DAY_KEY);
    }

    #[test]
    fn test_line_classification() {
        let line = |qty: f64, price: f64, ret: bool| LineItem {
            quantity: qty,
            total_price: price,
            total_tax: 0.0,
            total_cost: 0.0,
            total_discount: 0.0,
            is_return: ret,
        };

        assert_eq!(line(1.0, 100.0, false).classify(), LineClass::Gross);
        assert_eq!(line(-1.0, -50.0, false).classify(), LineClass::Returns);
        // Flagged return with all-positive numbers is still a return
        assert_eq!(line(1.0, 50.0, true).classify(), LineClass::Returns);
        // Any single negative field makes the line negative
        let mut l = line(1.0, 10.0, false);
        l.total_cost = -0.01;
        assert_eq!(l.classify(), LineClass::Returns);
    }
}
