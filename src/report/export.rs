//! CSV downloads for the admin dashboard.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use csv::{Terminator, WriterBuilder};
use std::fmt::Display;

use super::monthly::MonthlySummary;
use crate::attendance::AttendanceEvent;

pub const DETAILED_HEADERS: [&str; 6] = [
    "Date",
    "Time",
    "Staff Name",
    "Action",
    "Location",
    "AI Greeting",
];

pub const SUMMARY_HEADERS: [&str; 6] = [
    "Staff Name",
    "Month",
    "Year",
    "Total Present",
    "Total Absent",
    "Total Scans",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

/// Every record, newest first, with date and time rendered in `tz`.
pub fn detailed_csv<Tz>(events: &[AttendanceEvent], tz: &Tz) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut sorted: Vec<&AttendanceEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut wtr = writer();
    wtr.write_record(DETAILED_HEADERS)?;

    for event in sorted {
        let local: DateTime<Tz> = event.timestamp.with_timezone(tz);
        let location = match event.location {
            Some(point) => format!("{:.6}, {:.6}", point.latitude, point.longitude),
            None => "N/A".to_string(),
        };

        wtr.write_record([
            local.format("%Y-%m-%d").to_string(),
            local.format("%H:%M:%S").to_string(),
            event.staff_name.clone(),
            event.kind.label().to_string(),
            location,
            event.greeting.clone().unwrap_or_default(),
        ])?;
    }

    finish(wtr)
}

pub fn summary_csv(rows: &[MonthlySummary]) -> Result<String> {
    let mut wtr = writer();
    wtr.write_record(SUMMARY_HEADERS)?;

    for row in rows {
        wtr.write_record([
            row.staff_name.clone(),
            row.month_label.clone(),
            row.year.to_string(),
            row.days_present.to_string(),
            row.days_absent.to_string(),
            row.total_scans.to_string(),
        ])?;
    }

    finish(wtr)
}

/// Download name for an export generated on `date`, e.g.
/// `monthly_attendance_summary_2025-06-10.csv`.
pub fn export_filename(prefix: &str, date: chrono::NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}
