pub mod args;
mod clock;
mod config;

pub use args::{Cli, CliCommand, ClockCliArgs};
pub use clock::handle_clock_command;
pub use config::handle_config_command;
