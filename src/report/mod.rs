//! Attendance reporting: monthly summaries, day views and CSV exports.

pub mod export;
pub mod monthly;
pub mod overview;

pub use export::{detailed_csv, export_filename, summary_csv};
pub use monthly::{aggregate, MonthlyPeriod, MonthlySummary};
pub use overview::{records_for, today, DailyOverview};
