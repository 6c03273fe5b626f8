//! Creation-date filters for search queries.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Date-range filter over entity creation timestamps.
///
/// Named presets are resolved against the current clock at query time;
/// `Custom` runs from `start` through end-of-day (23:59:59.999) on `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum DateRangeFilter {
    /// The full previous calendar day.
    Yesterday,
    /// Rolling 7-day window ending now.
    Last7Days,
    /// Rolling 30-day window ending now.
    Last30Days,
    /// Rolling 365-day window ending now.
    LastYear,
    /// Explicit range; `end` is extended to the end of its calendar day.
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateRangeFilter {
    /// Resolve to concrete `(start, end)` boundaries, both inclusive.
    pub fn to_boundaries(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.boundaries_at(Utc::now())
    }

    /// Resolve boundaries against an explicit clock. Presets depend on
    /// `now`; `Custom` ignores it.
    pub fn boundaries_at(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::Yesterday => {
                let today_start = start_of_day(now);
                let yesterday_start = today_start - Duration::days(1);
                let yesterday_end = today_start - Duration::milliseconds(1);
                (yesterday_start, yesterday_end)
            }
            Self::Last7Days => (now - Duration::days(7), now),
            Self::Last30Days => (now - Duration::days(30), now),
            Self::LastYear => (now - Duration::days(365), now),
            Self::Custom { start, end } => (*start, end_of_day(*end)),
        }
    }

    /// Whether `timestamp` falls inside this range, resolved now.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let (start, end) = self.to_boundaries();
        timestamp >= start && timestamp <= end
    }
}

/// Midnight at the start of `t`'s calendar day (UTC).
fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
        .single()
        .unwrap_or(t)
}

/// 23:59:59.999 on `t`'s calendar day (UTC).
fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(t) + Duration::days(1) - Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn yesterday_is_the_full_previous_calendar_day() {
        let now = at(2026, 8, 25, 14, 30, 0);
        let (start, end) = DateRangeFilter::Yesterday.boundaries_at(now);
        assert_eq!(start, at(2026, 8, 24, 0, 0, 0));
        assert_eq!(end, at(2026, 8, 25, 0, 0, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn yesterday_excludes_today_and_two_days_prior() {
        let now = at(2026, 8, 25, 14, 30, 0);
        let (start, end) = DateRangeFilter::Yesterday.boundaries_at(now);

        let today = at(2026, 8, 25, 9, 0, 0);
        let yesterday = at(2026, 8, 24, 23, 59, 59);
        let two_days_ago = at(2026, 8, 23, 23, 59, 59);

        assert!(!(today >= start && today <= end));
        assert!(yesterday >= start && yesterday <= end);
        assert!(!(two_days_ago >= start && two_days_ago <= end));
    }

    #[test]
    fn rolling_windows_end_now() {
        let now = at(2026, 8, 25, 12, 0, 0);
        let (start, end) = DateRangeFilter::Last7Days.boundaries_at(now);
        assert_eq!(end, now);
        assert_eq!(start, now - Duration::days(7));

        let (start, _) = DateRangeFilter::Last30Days.boundaries_at(now);
        assert_eq!(start, now - Duration::days(30));

        let (start, _) = DateRangeFilter::LastYear.boundaries_at(now);
        assert_eq!(start, now - Duration::days(365));
    }

    #[test]
    fn custom_range_extends_end_to_end_of_day() {
        let filter = DateRangeFilter::Custom {
            start: at(2026, 1, 10, 8, 0, 0),
            end: at(2026, 1, 20, 9, 30, 0),
        };
        let (start, end) = filter.boundaries_at(at(2026, 8, 25, 0, 0, 0));
        assert_eq!(start, at(2026, 1, 10, 8, 0, 0));
        assert_eq!(end, at(2026, 1, 21, 0, 0, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn custom_range_boundary_inclusion() {
        let filter = DateRangeFilter::Custom {
            start: at(2026, 1, 10, 0, 0, 0),
            end: at(2026, 1, 20, 0, 0, 0),
        };
        let (start, end) = filter.boundaries_at(at(2026, 8, 25, 0, 0, 0));

        let inside_late = at(2026, 1, 20, 23, 59, 59);
        let just_after = at(2026, 1, 21, 0, 0, 0);
        let just_before = at(2026, 1, 9, 23, 59, 59);

        assert!(inside_late >= start && inside_late <= end);
        assert!(!(just_after >= start && just_after <= end));
        assert!(!(just_before >= start && just_before <= end));
    }

    #[test]
    fn serde_tagging_is_snake_case() {
        let json = serde_json::to_string(&DateRangeFilter::Last7Days).unwrap();
        assert_eq!(json, r#"{"preset":"last7_days"}"#);
    }
}
