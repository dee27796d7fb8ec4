use std::{fmt, sync::Arc};

use metrics::Counter;
use receiver_metrics::{Attribute, InstrumentDescriptor, Meter, MeterError, Unit};
use snafu::{ResultExt as _, Snafu};
use tracing::Level;

use crate::{ComponentId, Logger, TracingLogger};

/// Counter tracking the number of StatsD metrics received, by receiver and parse outcome.
pub const RECEIVED_STATSD_METRICS: InstrumentDescriptor = InstrumentDescriptor::new("receiver/received_statsd_metrics")
    .with_description("Number of statsd metrics received.")
    .with_unit(Unit::Count);

/// Attribute key identifying the receiver instance.
pub const RECEIVER_ATTRIBUTE_KEY: &str = "receiver";

/// Attribute key identifying the parse outcome.
pub const PARSE_SUCCESS_ATTRIBUTE_KEY: &str = "parse_success";

/// A reporter error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ReporterError {
    /// The counter instrument could not be registered with the meter.
    #[snafu(display("Failed to register counter instrument '{}': {}", instrument, source))]
    InstrumentRegistration {
        /// Instrument name.
        instrument: &'static str,

        /// Error source.
        source: MeterError,
    },
}

/// Outcome of parsing a StatsD line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParseOutcome {
    /// The line was parsed into a metric.
    Success,

    /// The line was rejected.
    Failure,
}

impl ParseOutcome {
    /// Returns the attribute attached to counter updates for this outcome.
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Success => Attribute::from_static(PARSE_SUCCESS_ATTRIBUTE_KEY, "true"),
            Self::Failure => Attribute::from_static(PARSE_SUCCESS_ATTRIBUTE_KEY, "false"),
        }
    }
}

/// Observer of parse outcomes.
///
/// This is the interface the StatsD parsing path reports through. Implementations must be safe to call concurrently
/// from any number of parsing tasks, and must not block.
pub trait ParseReporter: Send + Sync {
    /// Emits a debug message.
    ///
    /// The message is only formatted if debug logging is enabled. Prefer the [`on_debug!`][crate::on_debug] macro,
    /// which builds the arguments lazily.
    fn on_debug(&self, message: fmt::Arguments<'_>);

    /// Records that a single line failed to parse.
    fn record_parse_failure(&self);

    /// Records that `count` lines were parsed successfully.
    fn record_parse_success(&self, count: u64);
}

impl<T> ParseReporter for &T
where
    T: ParseReporter + ?Sized,
{
    fn on_debug(&self, message: fmt::Arguments<'_>) {
        (**self).on_debug(message)
    }

    fn record_parse_failure(&self) {
        (**self).record_parse_failure()
    }

    fn record_parse_success(&self, count: u64) {
        (**self).record_parse_success(count)
    }
}

impl<T> ParseReporter for Arc<T>
where
    T: ParseReporter + ?Sized,
{
    fn on_debug(&self, message: fmt::Arguments<'_>) {
        (**self).on_debug(message)
    }

    fn record_parse_failure(&self) {
        (**self).record_parse_failure()
    }

    fn record_parse_success(&self, count: u64) {
        (**self).record_parse_success(count)
    }
}

/// Settings used to construct a [`Reporter`].
pub struct ReporterSettings<L = TracingLogger> {
    /// Identifier of the receiver instance being reported on.
    pub receiver_id: ComponentId,

    /// Logger used for debug messages.
    pub logger: L,

    /// Meter used to register the counter instrument.
    pub meter: Meter,
}

impl ReporterSettings<TracingLogger> {
    /// Creates a new `ReporterSettings` that logs through the current default `tracing` dispatcher.
    pub fn new(receiver_id: ComponentId, meter: Meter) -> Self {
        Self {
            receiver_id,
            logger: TracingLogger::new(),
            meter,
        }
    }
}

impl<L> ReporterSettings<L> {
    /// Replaces the logger.
    pub fn with_logger<L2>(self, logger: L2) -> ReporterSettings<L2> {
        ReporterSettings {
            receiver_id: self.receiver_id,
            logger,
            meter: self.meter,
        }
    }
}

/// Parse outcome reporter.
///
/// Counts the StatsD lines parsed successfully and the lines rejected, on a single counter
/// ([`RECEIVED_STATSD_METRICS`]) split by a `parse_success` attribute, and attributed to the receiver instance through
/// a `receiver` attribute. Both attribute sets are resolved once, at construction, so recording an outcome is a single
/// atomic increment.
///
/// `Reporter` is immutable after construction, and is meant to be shared (for example, through an `Arc`) by every
/// parsing path of the receiver.
pub struct Reporter<L = TracingLogger> {
    logger: L,
    receiver_attribute: Attribute,
    parse_success: Counter,
    parse_failure: Counter,
}

impl<L> Reporter<L>
where
    L: Logger,
{
    /// Creates a new `Reporter`.
    ///
    /// # Errors
    ///
    /// If the counter instrument cannot be registered with the meter, an error is returned. Receivers should treat this
    /// as fatal.
    pub fn new(settings: ReporterSettings<L>) -> Result<Self, ReporterError> {
        let ReporterSettings {
            receiver_id,
            logger,
            meter,
        } = settings;

        let received = meter
            .u64_counter(RECEIVED_STATSD_METRICS)
            .context(InstrumentRegistration {
                instrument: RECEIVED_STATSD_METRICS.name(),
            })?;

        let receiver_attribute = Attribute::new(RECEIVER_ATTRIBUTE_KEY, receiver_id.to_string());
        let parse_success = received.bind([receiver_attribute.clone(), ParseOutcome::Success.attribute()]);
        let parse_failure = received.bind([receiver_attribute.clone(), ParseOutcome::Failure.attribute()]);

        Ok(Self {
            logger,
            receiver_attribute,
            parse_success,
            parse_failure,
        })
    }

    /// Returns the attribute identifying the receiver on every counter update.
    pub fn receiver_attribute(&self) -> &Attribute {
        &self.receiver_attribute
    }

    /// Records `count` lines with the given outcome.
    pub fn record(&self, outcome: ParseOutcome, count: u64) {
        let counter = match outcome {
            ParseOutcome::Success => &self.parse_success,
            ParseOutcome::Failure => &self.parse_failure,
        };
        counter.increment(count);
    }
}

impl<L> ParseReporter for Reporter<L>
where
    L: Logger,
{
    fn on_debug(&self, message: fmt::Arguments<'_>) {
        if self.logger.is_enabled(Level::DEBUG) {
            self.logger.log(Level::DEBUG, message);
        }
    }

    fn record_parse_failure(&self) {
        self.record(ParseOutcome::Failure, 1);
    }

    fn record_parse_success(&self, count: u64) {
        self.record(ParseOutcome::Success, count);
    }
}

impl<L> fmt::Debug for Reporter<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("instrument", &RECEIVED_STATSD_METRICS.name())
            .field("receiver", &self.receiver_attribute.value())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        thread,
    };

    use proptest::prelude::*;
    use receiver_metrics::test::{CounterDescription, CounterSeries, TestRecorder};

    use super::*;
    use crate::on_debug;

    /// Logger that records every message it is handed.
    struct RecordingLogger {
        enabled: bool,
        enabled_checks: AtomicUsize,
        messages: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        fn new(enabled: bool) -> Self {
            Self {
                enabled,
                enabled_checks: AtomicUsize::new(0),
                messages: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<(Level, String)> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Logger for RecordingLogger {
        fn is_enabled(&self, level: Level) -> bool {
            self.enabled_checks.fetch_add(1, Ordering::SeqCst);
            self.enabled && level <= Level::DEBUG
        }

        fn log(&self, level: Level, message: fmt::Arguments<'_>) {
            self.messages.lock().unwrap().push((level, message.to_string()));
        }
    }

    /// Argument that panics when formatted.
    struct Explosive;

    impl fmt::Display for Explosive {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("debug message was formatted while debug logging was disabled");
        }
    }

    /// Argument that counts how many times it has been formatted.
    struct Tally<'a>(&'a AtomicUsize);

    impl fmt::Display for Tally<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fetch_add(1, Ordering::SeqCst);
            f.write_str("tally")
        }
    }

    fn receiver_id(id: &str) -> ComponentId {
        id.parse().expect("should not fail to parse receiver ID")
    }

    fn build_reporter<L: Logger>(recorder: &TestRecorder, id: &str, logger: L) -> Reporter<L> {
        let settings = ReporterSettings::new(receiver_id(id), Meter::new(recorder.clone())).with_logger(logger);
        Reporter::new(settings).expect("should not fail to build reporter")
    }

    fn series(receiver: &str, parse_success: &str, total: u64) -> CounterSeries {
        CounterSeries {
            attributes: vec![
                (PARSE_SUCCESS_ATTRIBUTE_KEY.to_string(), parse_success.to_string()),
                (RECEIVER_ATTRIBUTE_KEY.to_string(), receiver.to_string()),
            ],
            total,
        }
    }

    fn totals(recorder: &TestRecorder) -> (u64, u64) {
        let all_series = recorder.counter_series(RECEIVED_STATSD_METRICS.name());
        let total_for = |outcome: &str| {
            all_series
                .iter()
                .filter(|s| s.attribute(PARSE_SUCCESS_ATTRIBUTE_KEY) == Some(outcome))
                .map(|s| s.total)
                .sum::<u64>()
        };
        (total_for("true"), total_for("false"))
    }

    #[test]
    fn registers_described_counter() {
        let recorder = TestRecorder::default();
        let _reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(false));

        assert_eq!(
            recorder.counter_description("receiver/received_statsd_metrics"),
            Some(CounterDescription {
                unit: Some(Unit::Count),
                description: "Number of statsd metrics received.".to_string(),
            })
        );
    }

    #[test]
    fn scenario() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd/default", RecordingLogger::new(false));

        reporter.record_parse_success(10);
        reporter.record_parse_failure();
        reporter.record_parse_success(2);

        assert_eq!(
            recorder.counter_series(RECEIVED_STATSD_METRICS.name()),
            vec![
                series("statsd/default", "false", 1),
                series("statsd/default", "true", 12),
            ]
        );
    }

    #[test]
    fn additivity() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(false));

        reporter.record_parse_success(5);
        reporter.record_parse_success(3);
        assert_eq!(totals(&recorder), (8, 0));

        reporter.record_parse_failure();
        reporter.record_parse_failure();
        reporter.record_parse_failure();
        assert_eq!(totals(&recorder), (8, 3));
    }

    #[test]
    fn zero_success_is_noop() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(false));

        reporter.record_parse_success(0);
        assert_eq!(totals(&recorder), (0, 0));

        reporter.record_parse_success(4);
        reporter.record_parse_success(0);
        assert_eq!(totals(&recorder), (4, 0));
    }

    #[test]
    fn exact_label_key() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd/default", RecordingLogger::new(false));
        reporter.record_parse_success(7);

        // The receiver attribute always comes first, followed by the outcome.
        let key = (
            RECEIVED_STATSD_METRICS.name(),
            vec![
                reporter.receiver_attribute().clone().into_label(),
                ParseOutcome::Success.attribute().into_label(),
            ],
        );
        assert_eq!(recorder.counter(key), Some(7));
    }

    #[test]
    fn reporters_are_isolated_by_receiver() {
        let recorder = TestRecorder::default();
        let meter = Meter::new(recorder.clone());
        let first = Reporter::new(ReporterSettings::new(receiver_id("statsd/first"), meter.clone()))
            .expect("should not fail to build reporter");
        let second = Reporter::new(ReporterSettings::new(receiver_id("statsd/second"), meter))
            .expect("should not fail to build reporter");

        first.record_parse_success(3);
        second.record_parse_failure();

        assert_eq!(
            recorder.counter_series(RECEIVED_STATSD_METRICS.name()),
            vec![
                series("statsd/first", "false", 0),
                series("statsd/second", "false", 1),
                series("statsd/first", "true", 3),
                series("statsd/second", "true", 0),
            ]
        );
    }

    #[test]
    fn construction_fails_on_conflicting_instrument() {
        let meter = Meter::noop();
        meter
            .u64_counter(RECEIVED_STATSD_METRICS.with_unit(Unit::Bytes))
            .expect("should not fail to register");

        let result = Reporter::new(ReporterSettings::new(ComponentId::statsd(), meter));
        match result {
            Err(ReporterError::InstrumentRegistration { instrument, source }) => {
                assert_eq!(instrument, "receiver/received_statsd_metrics");
                assert!(matches!(source, MeterError::ConflictingInstrument { .. }));
            }
            Ok(reporter) => panic!("expected construction to fail, got: {:?}", reporter),
        }
    }

    #[test]
    fn debug_disabled_never_formats() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(false));

        let formatted = AtomicUsize::new(0);
        on_debug!(reporter, "unparseable line {}: {}", Explosive, Tally(&formatted));

        assert_eq!(formatted.load(Ordering::SeqCst), 0);
        assert!(reporter.logger.messages().is_empty());
        assert_eq!(reporter.logger.enabled_checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_enabled_emits_interpolated_message() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(true));

        let formatted = AtomicUsize::new(0);
        let line = "cpu.load:0.5|x";
        on_debug!(reporter, "unparseable line {:?} ({}), {} bytes", line, Tally(&formatted), line.len());

        assert_eq!(formatted.load(Ordering::SeqCst), 1);
        assert_eq!(
            reporter.logger.messages(),
            vec![(
                Level::DEBUG,
                "unparseable line \"cpu.load:0.5|x\" (tally), 14 bytes".to_string()
            )]
        );
    }

    #[test]
    fn debug_logging_does_not_touch_counters() {
        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd", RecordingLogger::new(true));

        on_debug!(reporter, "just a message");
        assert_eq!(totals(&recorder), (0, 0));
    }

    #[test]
    fn shared_reporter() {
        let recorder = TestRecorder::default();
        let reporter = Arc::new(build_reporter(&recorder, "statsd", RecordingLogger::new(false)));

        fn report<R: ParseReporter>(reporter: R) {
            reporter.record_parse_success(2);
            reporter.record_parse_failure();
        }

        report(&*reporter);
        report(Arc::clone(&reporter));
        assert_eq!(totals(&recorder), (4, 2));
    }

    #[test]
    fn concurrent_updates() {
        const THREADS: u64 = 8;
        const ITERATIONS: u64 = 1_000;

        let recorder = TestRecorder::default();
        let reporter = build_reporter(&recorder, "statsd/default", RecordingLogger::new(false));

        thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for i in 0..ITERATIONS {
                        reporter.record_parse_success(3);
                        if i % 2 == 0 {
                            reporter.record_parse_failure();
                        }
                        on_debug!(reporter, "iteration {}", i);
                    }
                });
            }
        });

        assert_eq!(totals(&recorder), (THREADS * ITERATIONS * 3, THREADS * ITERATIONS / 2));
    }

    #[derive(Clone, Copy, Debug)]
    enum Call {
        Success(u64),
        Failure,
    }

    fn arb_call() -> impl Strategy<Value = Call> {
        prop_oneof![(0u64..1_000_000).prop_map(Call::Success), Just(Call::Failure)]
    }

    proptest! {
        #[test]
        fn property_test_attribution_and_additivity(
            kind in "[a-z][a-z0-9_]{0,15}",
            name in proptest::option::of("[a-z0-9_-]{1,16}"),
            calls in proptest::collection::vec(arb_call(), 0..64),
        ) {
            let id = match &name {
                Some(name) => format!("{}/{}", kind, name),
                None => kind.clone(),
            };

            let recorder = TestRecorder::default();
            let reporter = build_reporter(&recorder, &id, RecordingLogger::new(false));

            let mut expected_success = 0;
            let mut expected_failure = 0;
            for call in &calls {
                match call {
                    Call::Success(count) => {
                        reporter.record_parse_success(*count);
                        expected_success += count;
                    }
                    Call::Failure => {
                        reporter.record_parse_failure();
                        expected_failure += 1;
                    }
                }
            }

            // Every series carries exactly the receiver and one outcome, and no other series exist.
            let all_series = recorder.counter_series(RECEIVED_STATSD_METRICS.name());
            prop_assert_eq!(
                all_series,
                vec![series(&id, "false", expected_failure), series(&id, "true", expected_success)]
            );
        }
    }
}
