//! Parse outcome reporting for StatsD receivers.
//!
//! A [`Reporter`] sits between a StatsD line parser and the receiver's own telemetry: it counts how many lines were
//! parsed and how many were rejected, and emits debug messages only when debug logging is actually enabled.
//!
//! ## Example
//!
//! ```rust
//! use receiver_metrics::Meter;
//! use statsd_reporter::{on_debug, ComponentId, ParseReporter as _, Reporter, ReporterSettings};
//!
//! let receiver_id = "statsd/default".parse::<ComponentId>().unwrap();
//! let reporter = Reporter::new(ReporterSettings::new(receiver_id, Meter::noop())).unwrap();
//!
//! reporter.record_parse_success(10);
//! reporter.record_parse_failure();
//! on_debug!(reporter, "rejected line {:?}", "cpu.load:0.5|x");
//! ```
#![deny(missing_docs)]

mod config;
pub use self::config::ReporterConfiguration;

mod id;
pub use self::id::{ComponentId, ComponentIdError};

mod logger;
pub use self::logger::{Logger, TracingLogger, LOG_TARGET};

mod reporter;
pub use self::reporter::{
    ParseOutcome, ParseReporter, Reporter, ReporterError, ReporterSettings, PARSE_SUCCESS_ATTRIBUTE_KEY,
    RECEIVED_STATSD_METRICS, RECEIVER_ATTRIBUTE_KEY,
};

/// Emits a debug message through a [`ParseReporter`].
///
/// Takes the reporter followed by the same arguments as [`std::format!`]. The arguments are captured with
/// [`std::format_args!`], so nothing is formatted unless the reporter's logger has debug logging enabled.
///
/// ```rust
/// # use receiver_metrics::Meter;
/// # use statsd_reporter::{on_debug, ComponentId, Reporter, ReporterSettings};
/// # let reporter = Reporter::new(ReporterSettings::new(ComponentId::statsd(), Meter::noop())).unwrap();
/// let peer = "10.0.0.1:8125";
/// on_debug!(reporter, "received {} lines from {}", 3, peer);
/// ```
#[macro_export]
macro_rules! on_debug {
    ($reporter:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::ParseReporter as _;
        $reporter.on_debug(::std::format_args!($($arg)+))
    }};
}
