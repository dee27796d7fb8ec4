use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(about = "Replays recorded StatsD parse outcomes through a reporter and prints the resulting counters.")]
pub struct Cli {
    /// Enable verbose output. (Specify twice for more verbosity.)
    #[arg(short = 'v', long, action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,

    /// Path to a YAML configuration file.
    ///
    /// Values can also be set, or overridden, through environment variables prefixed with `STATSD_REPORTER_`.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Path to the outcome file to replay. Reads from standard input when not given.
    pub input: Option<PathBuf>,
}

impl Cli {
    /// Gets the configured log level based on the user-supplied verbosity level.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
