pub mod api;
pub mod app;
pub mod attendance;
pub mod capture;
pub mod cli;
pub mod clock;
pub mod config;
pub mod enrichment;
pub mod global;
pub mod greeting;
pub mod location;
pub mod report;
pub mod roster;
pub mod state;
