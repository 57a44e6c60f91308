//! CLI argument definitions
//!
//! All Clap derive structs for `brewtimer` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Guided pour-over brew timer.
#[derive(Parser, Debug)]
#[command(name = "brewtimer", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "BREWTIMER_COLOR")]
    pub color: ColorChoice,

    /// Log line format on stderr.
    #[arg(long, default_value = "human", global = true, env = "BREWTIMER_LOG_FORMAT")]
    pub log_format: LogFormatArg,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the guided timer for a recipe.
    Run(RunArgs),

    /// Validate recipe files.
    Validate(ValidateArgs),

    /// Print a recipe's step schedule.
    Schedule(ScheduleArgs),

    /// List recipes in the library.
    List(ListArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Command Arguments
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Recipe file path, or a recipe id in the library.
    pub recipe: String,

    /// Recipe library directory.
    #[arg(long, default_value = "./recipes", env = "BREWTIMER_LIBRARY")]
    pub library: PathBuf,

    /// Write timer events as JSONL to this file (`-` for stdout).
    #[arg(long)]
    pub events: Option<String>,

    /// Wait for a toggle instead of starting immediately.
    #[arg(long)]
    pub paused: bool,

    /// Keep the clock running after the last step ends.
    #[arg(long)]
    pub keep_running: bool,

    /// Length of one timer second (for demos and tests).
    #[arg(long, hide = true, value_parser = humantime::parse_duration)]
    pub tick: Option<Duration>,

    /// Expose Prometheus metrics on 127.0.0.1:<PORT>.
    #[arg(long, env = "BREWTIMER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Recipe files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `schedule`.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Recipe file path, or a recipe id in the library.
    pub recipe: String,

    /// Recipe library directory.
    #[arg(long, default_value = "./recipes", env = "BREWTIMER_LIBRARY")]
    pub library: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Recipe library directory.
    #[arg(long, default_value = "./recipes", env = "BREWTIMER_LIBRARY")]
    pub library: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Log format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// JSON lines.
    Json,
}

impl From<LogFormatArg> for crate::observability::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Human => Self::Human,
            LogFormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
