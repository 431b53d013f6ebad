//! Elapsed time between two timestamp fields, and time windows.
//!
//! Timestamps are RFC 3339 (`2024-06-20T14:30:00Z`); bare dates
//! (`2024-06-20`) read as midnight UTC. A record missing either end, or
//! carrying an unparseable one, is excluded and counted as such.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::storage::Record;

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Timestamp at `path` on a record
pub fn timestamp(record: &Record, path: &str) -> Option<DateTime<Utc>> {
    record.str_field(path).and_then(parse_timestamp)
}

/// Minutes from `start` to `end`; `None` if either is missing or invalid
pub fn minutes_between(record: &Record, start: &str, end: &str) -> Option<f64> {
    let start = timestamp(record, start)?;
    let end = timestamp(record, end)?;
    Some((end - start).num_seconds() as f64 / 60.0)
}

/// Average elapsed time over the records that carry both timestamps
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationSummary {
    pub measured: usize,
    pub excluded: usize,
    pub total_minutes: f64,
    pub average_minutes: Option<f64>,
}

impl DurationSummary {
    pub fn between<'a, I>(records: I, start: &str, end: &str) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut summary = Self {
            measured: 0,
            excluded: 0,
            total_minutes: 0.0,
            average_minutes: None,
        };

        for record in records {
            match minutes_between(record, start, end) {
                Some(minutes) => {
                    summary.measured += 1;
                    summary.total_minutes += minutes;
                }
                None => summary.excluded += 1,
            }
        }

        if summary.measured > 0 {
            summary.average_minutes = Some(summary.total_minutes / summary.measured as f64);
        }
        summary
    }

    /// Average in hours
    pub fn average_hours(&self) -> Option<f64> {
        self.average_minutes.map(|m| m / 60.0)
    }
}

/// Newest timestamp at `path` among `records`
pub fn newest<'a, I>(records: I, path: &str) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().filter_map(|r| timestamp(r, path)).max()
}

/// A trailing window ending at an anchor instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub anchor: DateTime<Utc>,
    start: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `length` ending at the newest timestamp in `records`.
    /// `None` when no record carries a timestamp.
    pub fn trailing<'a, I>(records: I, path: &str, length: Duration) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        newest(records, path).map(|anchor| Self::ending_at(anchor, length))
    }

    /// A start earlier than the first representable instant is clamped to it
    pub fn ending_at(anchor: DateTime<Utc>, length: Duration) -> Self {
        let start = anchor
            .checked_sub_signed(length)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { anchor, start }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns true if the record's timestamp lies inside the window
    /// (inclusive at both ends)
    pub fn contains(&self, record: &Record, path: &str) -> bool {
        timestamp(record, path)
            .map(|ts| ts >= self.start && ts <= self.anchor)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn incidents() -> Vec<Record> {
        vec![
            json!({"id": "inc_001", "created_at": "2024-06-20T14:30:00Z", "resolved_at": "2024-06-20T16:45:00Z"}),
            json!({"id": "inc_002", "created_at": "2024-06-19T09:15:00Z", "resolved_at": "2024-06-19T12:30:00Z"}),
            json!({"id": "inc_003", "created_at": "2024-06-21T08:00:00Z"}),
            json!({"id": "inc_004", "created_at": "2024-06-21T09:00:00Z", "resolved_at": null}),
            json!({"id": "inc_005", "created_at": "yesterday", "resolved_at": "2024-06-21T09:00:00Z"}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-06-20T14:30:00Z").is_some());
        assert!(parse_timestamp("2024-06-20T14:30:00+02:00").is_some());
        assert_eq!(
            parse_timestamp("2024-06-20"),
            parse_timestamp("2024-06-20T00:00:00Z")
        );
        assert!(parse_timestamp("June 20").is_none());
    }

    #[test]
    fn test_summary_excludes_unresolved() {
        let data = incidents();
        let summary = DurationSummary::between(&data, "created_at", "resolved_at");
        assert_eq!(summary.measured, 2);
        assert_eq!(summary.excluded, 3);
        assert_eq!(summary.average_minutes, Some(165.0));
        assert_eq!(summary.average_hours(), Some(2.75));
    }

    #[test]
    fn test_summary_over_nothing() {
        let summary = DurationSummary::between(Vec::<&Record>::new(), "a", "b");
        assert_eq!(summary.measured, 0);
        assert_eq!(summary.average_minutes, None);
    }

    #[test]
    fn test_trailing_window() {
        let data = incidents();
        let window = TimeWindow::trailing(&data, "created_at", Duration::hours(24)).unwrap();
        assert_eq!(window.anchor, parse_timestamp("2024-06-21T09:00:00Z").unwrap());

        let inside: Vec<_> = data
            .iter()
            .filter(|r| window.contains(r, "created_at"))
            .filter_map(|r| r.id())
            .collect();
        assert_eq!(inside, vec!["inc_001", "inc_003", "inc_004"]);
    }

    #[test]
    fn test_oversized_window_covers_everything() {
        let data = incidents();
        let window = TimeWindow::trailing(&data, "created_at", Duration::days(1_000_000_000)).unwrap();
        assert_eq!(window.start(), DateTime::<Utc>::MIN_UTC);

        let inside = data.iter().filter(|r| window.contains(r, "created_at")).count();
        assert_eq!(inside, 4);
    }

    #[test]
    fn test_window_without_timestamps() {
        let data: Vec<Record> = vec![Record::from_value(json!({"id": "x"})).unwrap()];
        assert!(TimeWindow::trailing(&data, "created_at", Duration::days(7)).is_none());
    }
}
