//! Per-staff, per-month attendance summaries.
//!
//! Every period touched by an event is reported, plus the period containing
//! the reference instant, newest first. Each period gets one row per staff
//! member even when the counts are all zero.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::attendance::AttendanceEvent;
use crate::roster::StaffMember;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month bucket. `month_index` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    pub year: i32,
    pub month_index: u32,
}

impl MonthlyPeriod {
    pub fn new(year: i32, month_index: u32) -> Self {
        Self { year, month_index }
    }

    pub fn containing<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::new(instant.year(), instant.month0())
    }

    pub fn label(&self) -> &'static str {
        MONTH_NAMES
            .get(self.month_index as usize)
            .copied()
            .unwrap_or("Unknown")
    }

    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month_index >= 11 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month_index + 2)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .map(|last| last.day())
            .unwrap_or(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month_index
    }

    /// Days that count toward attendance as of `reference`. The current day
    /// is counted as elapsed.
    pub fn days_elapsed<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> u32 {
        let current = Self::containing(reference);
        if *self == current {
            reference.day()
        } else if *self < current {
            self.days_in_month()
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub key: String,
    pub staff_name: String,
    pub month_label: String,
    pub year: i32,
    pub month_index: u32,
    pub days_present: u32,
    pub days_absent: u32,
    pub total_scans: u32,
}

/// Periods to report, newest first.
pub fn periods<Tz: TimeZone>(
    events: &[AttendanceEvent],
    reference: &DateTime<Tz>,
) -> Vec<MonthlyPeriod> {
    let tz = reference.timezone();
    let mut set: BTreeSet<MonthlyPeriod> = events
        .iter()
        .map(|e| MonthlyPeriod::containing(&e.timestamp.with_timezone(&tz)))
        .collect();
    set.insert(MonthlyPeriod::containing(reference));
    set.into_iter().rev().collect()
}

/// Build the monthly summary table.
///
/// `roster` is expected to hold staff-role members only. Events are matched
/// to members by display name, so two members sharing a name share counts.
/// Calendar dates are taken in the time zone of `reference`.
pub fn aggregate<Tz: TimeZone>(
    events: &[AttendanceEvent],
    roster: &[StaffMember],
    reference: &DateTime<Tz>,
) -> Vec<MonthlySummary> {
    let tz = reference.timezone();
    let dated: Vec<(&str, NaiveDate)> = events
        .iter()
        .map(|e| {
            (
                e.staff_name.as_str(),
                e.timestamp.with_timezone(&tz).date_naive(),
            )
        })
        .collect();

    let periods = periods(events, reference);
    debug!(
        "Aggregating {} events over {} periods for {} staff",
        events.len(),
        periods.len(),
        roster.len()
    );

    let mut rows = Vec::with_capacity(periods.len() * roster.len());
    for period in periods {
        let days_elapsed = period.days_elapsed(reference);

        for member in roster {
            let dates: Vec<NaiveDate> = dated
                .iter()
                .filter(|(name, date)| *name == member.display_name && period.contains(*date))
                .map(|(_, date)| *date)
                .collect();

            let days_present = dates.iter().collect::<HashSet<_>>().len() as u32;
            let total_scans = dates.len() as u32;

            rows.push(MonthlySummary {
                key: format!("{}-{}-{}", member.id, period.year, period.month_index),
                staff_name: member.display_name.clone(),
                month_label: period.label().to_string(),
                year: period.year,
                month_index: period.month_index,
                days_present,
                days_absent: days_elapsed.saturating_sub(days_present),
                total_scans,
            });
        }
    }

    rows
}
