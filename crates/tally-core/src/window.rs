//! # Report Window Resolution
//!
//! Converts a human reporting period (daily / weekly / monthly in a named
//! local time zone) into a half-open `[start_utc, end_utc)` interval.
//!
//! ## Period Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Report Windows (all half-open)                    │
//! │                                                                         │
//! │  daily    local midnight of date ──► next local midnight               │
//! │                                                                         │
//! │  weekly   local midnight of start ──► midnight AFTER the following     │
//! │           Sunday (the whole Sunday is inside the window)               │
//! │           week numbering: Monday=0 .. Sunday=6                          │
//! │                                                                         │
//! │  monthly  local midnight of the 1st ──► local midnight of next 1st     │
//! │           current month: end clamps to tomorrow's local midnight       │
//! │           (days that have not happened yet are excluded)               │
//! │                                                                         │
//! │  Boundaries are computed in the reporting zone, then returned in UTC.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

// =============================================================================
// Period Kind
// =============================================================================

/// The three recognized reporting period kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodKind::Daily => write!(f, "daily"),
            PeriodKind::Weekly => write!(f, "weekly"),
            PeriodKind::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(PeriodKind::Daily),
            "weekly" => Ok(PeriodKind::Weekly),
            "monthly" => Ok(PeriodKind::Monthly),
            other => Err(ReportError::InvalidPeriod(format!(
                "unknown period '{}'. Valid options: daily, weekly, monthly",
                other
            ))),
        }
    }
}

// =============================================================================
// Period Parameters
// =============================================================================

/// Raw, optional period parameters as supplied by the caller.
///
/// Which fields apply depends on the kind: daily uses `date`, weekly uses
/// `start_date`, monthly uses `year`/`month`. Unused fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodParams {
    /// Reference date for daily reports (`YYYY-MM-DD`).
    pub date: Option<String>,
    /// Start date for weekly reports (`YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Year for monthly reports.
    pub year: Option<i32>,
    /// Month (1-12) for monthly reports.
    pub month: Option<u32>,
}

/// A validated reporting period, ready to resolve against a zone and "now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily { date: Option<NaiveDate> },
    Weekly { start_date: Option<NaiveDate> },
    Monthly { year: Option<i32>, month: Option<u32> },
}

impl ReportPeriod {
    /// Builds a period from a kind string and raw parameters.
    ///
    /// Fails with `InvalidPeriod` on an unknown kind or a date that does
    /// not parse as `YYYY-MM-DD`.
    pub fn new(kind: &str, params: PeriodParams) -> ReportResult<Self> {
        match kind.parse::<PeriodKind>()? {
            PeriodKind::Daily => Ok(ReportPeriod::Daily {
                date: parse_opt_date(params.date.as_deref())?,
            }),
            PeriodKind::Weekly => Ok(ReportPeriod::Weekly {
                start_date: parse_opt_date(params.start_date.as_deref())?,
            }),
            PeriodKind::Monthly => Ok(ReportPeriod::Monthly {
                year: params.year,
                month: params.month,
            }),
        }
    }

    /// The kind of this period.
    pub fn kind(&self) -> PeriodKind {
        match self {
            ReportPeriod::Daily { .. } => PeriodKind::Daily,
            ReportPeriod::Weekly { .. } => PeriodKind::Weekly,
            ReportPeriod::Monthly { .. } => PeriodKind::Monthly,
        }
    }

    /// Resolves this period into a UTC window.
    ///
    /// `now_utc` is passed in rather than read from the clock so the whole
    /// pipeline stays a pure function of (period, now, data).
    pub fn resolve(&self, tz: Tz, now_utc: DateTime<Utc>) -> ReportResult<ReportWindow> {
        let today = now_utc.with_timezone(&tz).date_naive();

        match self {
            ReportPeriod::Daily { date } => {
                let date = date.unwrap_or(today);
                let next = add_days(date, 1)?;
                Ok(ReportWindow {
                    kind: PeriodKind::Daily,
                    timezone: tz,
                    start_utc: local_midnight(tz, date),
                    end_utc: local_midnight(tz, next),
                    echo: ResolvedParams {
                        date: Some(date.to_string()),
                        ..ResolvedParams::default()
                    },
                })
            }

            ReportPeriod::Weekly { start_date } => {
                // Default start: Monday of the current week (Monday=0..Sunday=6).
                let start = match start_date {
                    Some(d) => *d,
                    None => sub_days(today, today.weekday().num_days_from_monday() as u64)?,
                };
                // The following Sunday relative to the start date; the window
                // ends at the midnight after it, so the Sunday is included.
                let days_until_sunday = 6 - start.weekday().num_days_from_monday() as u64;
                let end_date = add_days(start, days_until_sunday + 1)?;
                Ok(ReportWindow {
                    kind: PeriodKind::Weekly,
                    timezone: tz,
                    start_utc: local_midnight(tz, start),
                    end_utc: local_midnight(tz, end_date),
                    echo: ResolvedParams {
                        start_date: Some(start.to_string()),
                        ..ResolvedParams::default()
                    },
                })
            }

            ReportPeriod::Monthly { year, month } => {
                let year = year.unwrap_or_else(|| today.year());
                let month = month.unwrap_or_else(|| today.month());
                let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                    ReportError::InvalidPeriod(format!("invalid year/month {}-{}", year, month))
                })?;
                let next_first = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(|| {
                    ReportError::InvalidPeriod(format!("invalid year/month {}-{}", year, month))
                })?;

                // Current month: exclude days that have not happened yet.
                let end_date = if year == today.year() && month == today.month() {
                    add_days(today, 1)?
                } else {
                    next_first
                };

                Ok(ReportWindow {
                    kind: PeriodKind::Monthly,
                    timezone: tz,
                    start_utc: local_midnight(tz, first),
                    end_utc: local_midnight(tz, end_date),
                    echo: ResolvedParams {
                        year: Some(year),
                        month: Some(month),
                        ..ResolvedParams::default()
                    },
                })
            }
        }
    }
}

// =============================================================================
// Resolved Window
// =============================================================================

/// Parameter echo carried into the final report.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResolvedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

/// A resolved half-open UTC reporting window.
#[derive(Debug, Clone)]
pub struct ReportWindow {
    pub kind: PeriodKind,
    pub timezone: Tz,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    /// Resolved parameters, echoed in the report.
    pub echo: ResolvedParams,
}

impl ReportWindow {
    /// Window start as a UTC ISO-8601 string with `Z` suffix.
    pub fn date_from(&self) -> String {
        self.start_utc.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Window end as a UTC ISO-8601 string with `Z` suffix.
    pub fn date_to(&self) -> String {
        self.end_utc.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_opt_date(raw: Option<&str>) -> ReportResult<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ReportError::InvalidPeriod(format!(
                    "unparsable date '{}' (expected YYYY-MM-DD)",
                    s
                ))
            }),
    }
}

fn add_days(date: NaiveDate, days: u64) -> ReportResult<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| ReportError::InvalidPeriod(format!("date out of range: {}", date)))
}

fn sub_days(date: NaiveDate, days: u64) -> ReportResult<NaiveDate> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| ReportError::InvalidPeriod(format!("date out of range: {}", date)))
}

/// UTC instant of local midnight on `date` in `tz`.
///
/// Zones that skip midnight across a DST gap resolve to the first valid
/// instant after it; ambiguous midnights resolve to the earlier instant.
fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
