//! Tenant-local calendar arithmetic.
//!
//! All matching is done on calendar dates in the tenant's own IANA timezone,
//! never on instants: "birthday today" compares month-day strings so no
//! per-year anniversary bookkeeping is needed, and "expires in N days" is a
//! whole-day difference between two local dates.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Zone applied when a tenant's rules name none (or an unknown one).
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Mexico_City;

/// Parse an IANA zone name, falling back to [`DEFAULT_TIMEZONE`].
pub fn parse_timezone(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse().ok()).unwrap_or(DEFAULT_TIMEZONE)
}

/// Project a fixed instant into a zone's local calendar date (DST-aware).
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Lenient `YYYY-MM-DD…` parse: only the leading ten characters matter, any
/// time component is ignored. Returns `None` for anything unparsable.
pub fn parse_ymd(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Signed whole days from `today` until the date in `raw`, or `None` when the
/// input does not carry a parseable date.
pub fn days_until(raw: &str, today: NaiveDate) -> Option<i64> {
    parse_ymd(raw).map(|target| (target - today).num_days())
}

/// `MM-DD` of the date in `raw`, ignoring the year, or `None` when unparsable.
pub fn month_day(raw: &str) -> Option<String> {
    parse_ymd(raw).map(month_day_of)
}

/// `MM-DD` of an already-parsed date.
pub fn month_day_of(date: NaiveDate) -> String {
    format!("{:02}-{:02}", date.month(), date.day())
}
