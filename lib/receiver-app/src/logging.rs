//! Logging.

use tracing::{level_filters::LevelFilter, Subscriber};
use tracing_subscriber::{
    layer::SubscriberExt as _, registry::LookupSpan, util::SubscriberInitExt as _, EnvFilter, Layer,
};

use crate::GenericError;

/// Environment variable holding the log filtering directives.
pub const LOG_LEVEL_ENV_VAR: &str = "RECEIVER_LOG_LEVEL";

/// Environment variable controlling whether logs are emitted as JSON.
pub const LOG_FORMAT_JSON_ENV_VAR: &str = "RECEIVER_LOG_FORMAT_JSON";

/// Logs a message to standard error and exits the process with a non-zero exit code.
pub fn fatal_and_exit(message: String) -> ! {
    eprintln!("FATAL: {}", message);
    std::process::exit(1);
}

/// Initializes the logging subsystem for `tracing`.
///
/// This function reads the `RECEIVER_LOG_LEVEL` environment variable to determine the log filtering directives to use.
/// If the environment variable is not set, `default_level` is used, falling back to `INFO` when not given.
/// Additionally, it reads the `RECEIVER_LOG_FORMAT_JSON` environment variable to determine which output format to use.
/// If it is set to `true` or `1` (case insensitive), the logs will be formatted as JSON. Otherwise, logs default to a
/// human-readable format.
///
/// # Errors
///
/// If the logging subsystem was already initialized, an error will be returned.
pub fn initialize_logging(default_level: Option<LevelFilter>) -> Result<(), GenericError> {
    let is_json = is_flag_enabled(std::env::var(LOG_FORMAT_JSON_ENV_VAR).ok().as_deref());
    let level_filter = build_level_filter(default_level, std::env::var(LOG_LEVEL_ENV_VAR).ok().as_deref());

    if is_json {
        tracing_subscriber::registry()
            .with(initialize_tracing_json().with_filter(level_filter))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(initialize_tracing_pretty().with_filter(level_filter))
            .try_init()?;
    }

    Ok(())
}

fn is_flag_enabled(value: Option<&str>) -> bool {
    value
        .map(|s| s.trim().to_lowercase())
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false)
}

fn build_level_filter(default_level: Option<LevelFilter>, directives: Option<&str>) -> EnvFilter {
    // Invalid directives are skipped.
    EnvFilter::builder()
        .with_default_directive(default_level.unwrap_or(LevelFilter::INFO).into())
        .parse_lossy(directives.unwrap_or_default())
}

fn initialize_tracing_json<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::Layer::new()
        .json()
        .flatten_event(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
}

fn initialize_tracing_pretty<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::Layer::new().with_target(true).with_writer(std::io::stderr)
}
