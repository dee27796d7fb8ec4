use std::{io::BufRead, num::ParseIntError};

use metrics::{SharedString, Unit};
use metrics_util::{debugging::DebugValue, CompositeKey};
use receiver_app::GenericError;
use snafu::{ResultExt as _, Snafu};
use statsd_reporter::{on_debug, ParseReporter};
use tracing::trace;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(context(suffix(false)))]
pub enum RecordError {
    #[snafu(display("Line {}: unknown record type '{}'.", line_number, kind))]
    UnknownRecord { line_number: usize, kind: String },

    #[snafu(display("Line {}: missing count for 'ok' record.", line_number))]
    MissingCount { line_number: usize },

    #[snafu(display("Line {}: invalid count '{}': {}", line_number, count, source))]
    InvalidCount {
        line_number: usize,
        count: String,
        source: ParseIntError,
    },

    #[snafu(display("Line {}: total success count overflows a 64-bit counter.", line_number))]
    CountOverflow { line_number: usize },
}

/// A single recorded parse outcome.
#[derive(Debug, PartialEq)]
pub enum Record<'a> {
    /// `ok <count>`: a batch of lines parsed successfully.
    Success(u64),

    /// `err`: a single line rejected. Anything after the record type is kept as the reason.
    Failure(Option<&'a str>),

    /// `debug <message>`: a debug message.
    Debug(&'a str),
}

pub fn parse_record(line: &str, line_number: usize) -> Result<Option<Record<'_>>, RecordError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (kind, rest) = match line.split_once(char::is_whitespace) {
        Some((kind, rest)) => (kind, rest.trim()),
        None => (line, ""),
    };

    let record = match kind {
        "ok" => {
            if rest.is_empty() {
                return Err(RecordError::MissingCount { line_number });
            }
            let count = rest.parse::<u64>().context(InvalidCount { line_number, count: rest })?;
            Record::Success(count)
        }
        "err" => Record::Failure((!rest.is_empty()).then_some(rest)),
        "debug" => Record::Debug(rest),
        other => {
            return Err(RecordError::UnknownRecord {
                line_number,
                kind: other.to_string(),
            })
        }
    };

    Ok(Some(record))
}

#[derive(Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub records: usize,
    pub successes: u64,
    pub failures: u64,
}

/// Replays every record read from `input` through `reporter`.
///
/// Stops at the first malformed record.
pub fn replay<R, P>(input: R, reporter: &P) -> Result<ReplaySummary, GenericError>
where
    R: BufRead,
    P: ParseReporter,
{
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let Some(record) = parse_record(&line, line_number)? else {
            continue;
        };

        trace!(?record, "Replaying record.");
        match record {
            Record::Success(count) => {
                // The counter is only updated once the new total is known to fit.
                summary.successes = summary
                    .successes
                    .checked_add(count)
                    .ok_or(RecordError::CountOverflow { line_number })?;
                reporter.record_parse_success(count);
            }
            Record::Failure(reason) => {
                reporter.record_parse_failure();
                if let Some(reason) = reason {
                    on_debug!(reporter, "Failed to parse line: {}", reason);
                }
                summary.failures += 1;
            }
            Record::Debug(message) => on_debug!(reporter, "{}", message),
        }
        summary.records += 1;
    }

    Ok(summary)
}

/// Renders the counters in a metrics snapshot, one series per line, in sorted order.
pub fn render_series(snapshot: Vec<(CompositeKey, Option<Unit>, Option<SharedString>, DebugValue)>) -> Vec<String> {
    let mut lines = snapshot
        .into_iter()
        .filter_map(|(key, _, _, value)| {
            let DebugValue::Counter(value) = value else {
                return None;
            };

            let mut labels = key
                .key()
                .labels()
                .map(|label| format!("{}=\"{}\"", label.key(), label.value()))
                .collect::<Vec<_>>();
            labels.sort();

            Some(format!("{}{{{}}} {}", key.key().name(), labels.join(","), value))
        })
        .collect::<Vec<_>>();
    lines.sort();
    lines
}
