//! Attendance records produced by a clock-in or clock-out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceKind {
    ClockIn,
    ClockOut,
}

impl AttendanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceKind::ClockIn => "CLOCK_IN",
            AttendanceKind::ClockOut => "CLOCK_OUT",
        }
    }

    /// Human-readable action name used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceKind::ClockIn => "CLOCK IN",
            AttendanceKind::ClockOut => "CLOCK OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: String,
    pub staff_name: String,
    pub timestamp: DateTime<Utc>,
    /// Encoded still as a data URL.
    pub photo: String,
    pub kind: AttendanceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl AttendanceEvent {
    /// A record created at capture time, before greeting and location resolve.
    pub fn provisional(
        staff_name: &str,
        kind: AttendanceKind,
        photo: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            staff_name: staff_name.to_string(),
            timestamp,
            photo,
            kind,
            greeting: None,
            pending: true,
            location: None,
        }
    }

    /// Final form of a provisional record. Keeps the id so it replaces the
    /// provisional one in place.
    pub fn enriched(self, greeting: String, location: Option<GeoPoint>) -> Self {
        Self {
            greeting: Some(greeting),
            location,
            pending: false,
            ..self
        }
    }
}
