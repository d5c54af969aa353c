//! Day-level views for the dashboards.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::HashSet;

use crate::attendance::AttendanceEvent;

#[derive(Debug, Clone, Serialize)]
pub struct DailyOverview {
    pub date: NaiveDate,
    pub records_today: Vec<AttendanceEvent>,
    /// Distinct staff names with at least one record today.
    pub active_staff: usize,
    pub total_staff: usize,
    /// Every record held, any day.
    pub total_records: usize,
    /// Records with a resolved location, any day.
    pub located_records: usize,
}

pub fn today<Tz: TimeZone>(
    events: &[AttendanceEvent],
    total_staff: usize,
    now: &DateTime<Tz>,
) -> DailyOverview {
    let tz = now.timezone();
    let date = now.date_naive();

    let records_today: Vec<AttendanceEvent> = events
        .iter()
        .filter(|e| e.timestamp.with_timezone(&tz).date_naive() == date)
        .cloned()
        .collect();

    let active_staff = records_today
        .iter()
        .map(|e| e.staff_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    DailyOverview {
        date,
        records_today,
        active_staff,
        total_staff,
        total_records: events.len(),
        located_records: events.iter().filter(|e| e.location.is_some()).count(),
    }
}

/// A staff member's own history, in the order the events are held.
pub fn records_for<'a>(events: &'a [AttendanceEvent], display_name: &str) -> Vec<&'a AttendanceEvent> {
    events
        .iter()
        .filter(|e| e.staff_name == display_name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{AttendanceKind, GeoPoint};
    use chrono::Utc;

    fn event(name: &str, rfc3339: &str) -> AttendanceEvent {
        let timestamp = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc);
        AttendanceEvent::provisional(name, AttendanceKind::ClockIn, String::new(), timestamp)
    }

    #[test]
    fn test_today_counts_distinct_staff() {
        let here = GeoPoint {
            latitude: 51.5,
            longitude: -0.12,
        };
        let events = vec![
            event("Alex Chen", "2025-06-10T08:00:00Z").enriched("Hi".to_string(), Some(here)),
            event("Alex Chen", "2025-06-10T17:00:00Z"),
            event("Sarah Jones", "2025-06-10T09:00:00Z").enriched("Hi".to_string(), None),
            event("Mike Ross", "2025-06-09T09:00:00Z").enriched("Hi".to_string(), Some(here)),
        ];
        let now = DateTime::parse_from_rfc3339("2025-06-10T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let overview = today(&events, 4, &now);
        assert_eq!(overview.records_today.len(), 3);
        assert_eq!(overview.active_staff, 2);
        assert_eq!(overview.total_staff, 4);
        assert_eq!(overview.total_records, 4);
        assert_eq!(overview.located_records, 2);
    }

    #[test]
    fn test_records_for_filters_by_name() {
        let events = vec![
            event("Alex Chen", "2025-06-10T08:00:00Z"),
            event("Sarah Jones", "2025-06-10T09:00:00Z"),
        ];
        let mine = records_for(&events, "Sarah Jones");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].staff_name, "Sarah Jones");
    }
}
