//! Logging initialization.
//!
//! Everything goes to stderr. During `brewtimer run` the status line also
//! lives on stderr, so the default level is quiet enough not to break it:
//! only warnings (failed sinks, skipped library files) show up unless `-v`
//! is given.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding an explicit `EnvFilter` directive.
pub const LOG_LEVEL_ENV: &str = "BREWTIMER_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON, one object per record.
    Json,
}

/// Filter directive for a `-v` count.
///
/// Extra verbosity applies to this crate only; dependencies such as the
/// Prometheus exporter stay at `warn` until `-vvv`.
///
/// | `-v` count | this crate | dependencies |
/// |-----------:|------------|--------------|
/// | 0          | warn       | warn         |
/// | 1          | info       | warn         |
/// | 2          | debug      | warn         |
/// | 3+         | trace      | trace        |
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,brewtimer=info",
        2 => "warn,brewtimer=debug",
        _ => "trace",
    }
}

/// Installs the global tracing subscriber.
///
/// What each level adds for a brew:
///
/// - `info`: recipe started, paused, resumed and step completed events
///   (via [`TracingSink`](crate::notify::TracingSink)), library scans
/// - `debug`: navigation jumps, resets, declared-total mismatches
/// - `trace`: dependency internals
///
/// A valid directive in `BREWTIMER_LOG_LEVEL` replaces the `-v` mapping.
/// Module targets are printed from `-vv` up. Repeated calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi(color))
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
        }
    }
}
