use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::attendance::AttendanceKind;
use crate::location::AccuracyProfile;

#[derive(Parser, Debug)]
#[command(name = "staffsnap")]
#[command(about = "Photo attendance tracker for small teams", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Clock in or out once from the terminal
    Clock(ClockCliArgs),
    /// Show the config file location and contents
    Config,
}

#[derive(ClapArgs, Debug)]
pub struct ClockCliArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long)]
    pub password: String,
    /// Whether this is a clock in or a clock out
    #[arg(short, long, value_enum)]
    pub kind: KindArg,
    /// Location accuracy profile (default: from config)
    #[arg(short, long, value_enum)]
    pub accuracy: Option<AccuracyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    In,
    Out,
}

impl From<KindArg> for AttendanceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::In => AttendanceKind::ClockIn,
            KindArg::Out => AttendanceKind::ClockOut,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AccuracyArg {
    High,
    Medium,
    Low,
}

impl From<AccuracyArg> for AccuracyProfile {
    fn from(accuracy: AccuracyArg) -> Self {
        match accuracy {
            AccuracyArg::High => AccuracyProfile::High,
            AccuracyArg::Medium => AccuracyProfile::Medium,
            AccuracyArg::Low => AccuracyProfile::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_command() {
        let cli = Cli::try_parse_from([
            "staffsnap", "clock", "--username", "staff", "--password", "staff", "--kind", "out",
            "--accuracy", "low",
        ])
        .unwrap();

        let Some(CliCommand::Clock(args)) = cli.command else {
            panic!("expected clock command");
        };
        assert_eq!(args.username, "staff");
        assert_eq!(AttendanceKind::from(args.kind), AttendanceKind::ClockOut);
        assert_eq!(
            args.accuracy.map(AccuracyProfile::from),
            Some(AccuracyProfile::Low)
        );
    }

    #[test]
    fn test_no_subcommand_runs_service() {
        let cli = Cli::try_parse_from(["staffsnap", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }
}
