//! Resolution of record dates into an epoch-millisecond ordinal used for ordering.
//!
//! The backend sends dates in three shapes: an ISO-like string, a `[year, month, day]` triple, or
//! nothing at all. Every shape resolves to an `i64`, with `0` standing in for anything absent or
//! unparseable.

use chrono::{
    DateTime, Duration, Local, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use serde_json::Value;
use tracing::trace;

/// Date-time layouts without an offset. These are interpreted in the local time zone.
const LOCAL_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// The `date` of a raw record, classified by shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RecordDate {
    /// The field is missing or null.
    #[default]
    Missing,
    /// A `[year, month, day]` triple, month being 1-based.
    Triple([Value; 3]),
    /// Any other value, parsed as a timestamp.
    Other(Value),
}

impl From<Option<Value>> for RecordDate {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => RecordDate::Missing,
            Some(Value::Array(items)) if items.len() == 3 => {
                let mut items = items.into_iter();
                let mut next = || items.next().unwrap_or_default();
                RecordDate::Triple([next(), next(), next()])
            }
            Some(other) => RecordDate::Other(other),
        }
    }
}

impl RecordDate {
    /// Returns the epoch-millisecond ordinal of this date, `0` when absent or unparseable.
    pub fn ordinal(&self) -> i64 {
        let resolved = match self {
            RecordDate::Missing => return 0,
            RecordDate::Triple([year, month, day]) => triple_ordinal(year, month, day),
            RecordDate::Other(Value::String(s)) => parse_timestamp(s),
            RecordDate::Other(Value::Number(n)) => n.as_f64().and_then(whole),
            RecordDate::Other(_) => None,
        };
        match resolved {
            Some(ordinal) => ordinal,
            None => {
                trace!("Unable to resolve record date {self:?}, using 0");
                0
            }
        }
    }
}

/// Resolves a `[year, month, day]` triple to local midnight.
///
/// Falsy components default (year to `0`, month and day to `1`). Years `0` through `99` mean
/// `1900` through `1999`. Out-of-range months and days roll over into the neighbouring months and
/// years.
fn triple_ordinal(year: &Value, month: &Value, day: &Value) -> Option<i64> {
    let year = component(year, 0)?;
    let month = component(month, 1)?;
    let day = component(day, 1)?;

    let year = match i32::try_from(year).ok()? {
        short @ 0..=99 => 1900 + short,
        full => full,
    };
    let first_of_year = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let months = month.checked_sub(1)?;
    let first_of_month = if months >= 0 {
        first_of_year.checked_add_months(Months::new(u32::try_from(months).ok()?))?
    } else {
        first_of_year.checked_sub_months(Months::new(u32::try_from(-months).ok()?))?
    };
    let date = first_of_month.checked_add_signed(Duration::try_days(day.checked_sub(1)?)?)?;
    local_midnight_millis(date)
}

/// Reads one component of a date triple. Returns `None` when the component makes the date invalid.
fn component(value: &Value, default: i64) -> Option<i64> {
    match value {
        Value::Null | Value::Bool(false) => Some(default),
        Value::Bool(true) => Some(1),
        Value::Number(n) => {
            let n = n.as_f64()?;
            if n == 0.0 {
                Some(default)
            } else {
                whole(n)
            }
        }
        Value::String(s) if s.is_empty() => Some(default),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                // whitespace-only text counts as zero, but is not falsy
                return Some(0);
            }
            whole(trimmed.parse::<f64>().ok()?)
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn whole(n: f64) -> Option<i64> {
    if !n.is_finite() || n.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(n.trunc() as i64)
}

/// Local midnight of `date` in epoch milliseconds. A midnight skipped by a DST transition resolves
/// to the first hour that exists.
fn local_midnight_millis(date: NaiveDate) -> Option<i64> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    local_millis(midnight)
        .or_else(|| local_millis(midnight.checked_add_signed(Duration::try_hours(1)?)?))
}

fn local_millis(naive: NaiveDateTime) -> Option<i64> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
        LocalResult::None => None,
    }
}

/// Parses a timestamp string.
///
/// - RFC 3339 and RFC 2822 carry their own offset.
/// - A date and time without an offset is local time.
/// - A bare `YYYY-MM-DD` date is midnight UTC.
fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in LOCAL_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_millis(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn local_midnight(y: i32, m: u32, d: u32) -> i64 {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .timestamp_millis()
    }

    fn ordinal(value: Value) -> i64 {
        RecordDate::from(Some(value)).ordinal()
    }

    #[test]
    fn test_missing_date() {
        assert_eq!(RecordDate::from(None).ordinal(), 0);
        assert_eq!(ordinal(Value::Null), 0);
    }

    #[test]
    fn test_triple_is_local_midnight() {
        assert_eq!(ordinal(json!([2024, 3, 15])), local_midnight(2024, 3, 15));
    }

    #[test]
    fn test_triple_with_text_components() {
        assert_eq!(
            ordinal(json!(["2024", "3", "15"])),
            local_midnight(2024, 3, 15)
        );
    }

    #[test]
    fn test_triple_falsy_month_and_day_default_to_one() {
        assert_eq!(ordinal(json!([2024, 0, null])), local_midnight(2024, 1, 1));
        assert_eq!(ordinal(json!([2024, false, ""])), local_midnight(2024, 1, 1));
    }

    #[test]
    fn test_triple_rolls_over() {
        assert_eq!(ordinal(json!([2023, 13, 1])), local_midnight(2024, 1, 1));
        assert_eq!(ordinal(json!([2024, 2, 30])), local_midnight(2024, 3, 1));
    }

    #[test]
    fn test_triple_with_garbage_component() {
        assert_eq!(ordinal(json!([2024, "march", 15])), 0);
        assert_eq!(ordinal(json!([2024, [3], 15])), 0);
        assert_eq!(ordinal(json!([2024, 1, i64::MIN])), 0);
        assert_eq!(ordinal(json!([2024, i64::MIN, 1])), 0);
        assert_eq!(ordinal(json!([2024, 1, -9.223372036854775808e18])), 0);
    }

    #[test]
    fn test_triple_two_digit_years_are_twentieth_century() {
        assert_eq!(ordinal(json!([null, 1, 1])), local_midnight(1900, 1, 1));
        assert_eq!(ordinal(json!([99, 12, 31])), local_midnight(1999, 12, 31));
        assert_eq!(ordinal(json!([100, 1, 1])), local_midnight(100, 1, 1));
    }

    #[test]
    fn test_wrong_length_sequence() {
        assert_eq!(ordinal(json!([2024, 3])), 0);
        assert_eq!(ordinal(json!([2024, 3, 15, 0])), 0);
    }

    #[test]
    fn test_not_a_date() {
        assert_eq!(ordinal(json!("not-a-date")), 0);
        assert_eq!(ordinal(json!("")), 0);
        assert_eq!(ordinal(json!({"year": 2024})), 0);
    }

    #[test]
    fn test_date_only_string_is_utc_midnight() {
        assert_eq!(ordinal(json!("2024-01-10")), 1_704_844_800_000);
    }

    #[test]
    fn test_rfc3339_string() {
        assert_eq!(ordinal(json!("2024-01-10T00:00:00Z")), 1_704_844_800_000);
        assert_eq!(
            ordinal(json!("2024-01-10T03:00:00+03:00")),
            1_704_844_800_000
        );
    }

    #[test]
    fn test_local_date_time_string() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(ordinal(json!("2024-01-10T14:30:00")), expected);
    }

    #[test]
    fn test_number_is_epoch_millis() {
        assert_eq!(ordinal(json!(1_704_844_800_000_i64)), 1_704_844_800_000);
    }
}
