//! CLI command definitions and handlers.

pub mod analyze;

use clap::{Parser, Subcommand};

/// Skin-diag - deterministic skin photo analysis
#[derive(Parser)]
#[command(name = "skin-diag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared analyze arguments (paths, language, output flags).
    #[command(flatten)]
    pub analyze: analyze::AnalyzeArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze skin photos
    Analyze(analyze::AnalyzeArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every photo produced a diagnosis.
    Success,
    /// At least one photo was unreadable or failed closed.
    PhotosFailed,
    /// The command could not run.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::PhotosFailed => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
