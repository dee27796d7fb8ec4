use std::{fmt, sync::Arc};

use tracing::{Dispatch, Level};

/// A level-gated log sink.
///
/// Checking whether a level is enabled is expected to be cheap, and is always done before a message is handed over, so
/// that formatting is only paid for when the message will actually be emitted.
pub trait Logger: Send + Sync {
    /// Returns `true` if messages at the given level would be emitted.
    fn is_enabled(&self, level: Level) -> bool;

    /// Emits the given message at the given level.
    ///
    /// Failures to emit are not surfaced: logging is best-effort.
    fn log(&self, level: Level, message: fmt::Arguments<'_>);
}

impl<T> Logger for Arc<T>
where
    T: Logger + ?Sized,
{
    fn is_enabled(&self, level: Level) -> bool {
        (**self).is_enabled(level)
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        (**self).log(level, message)
    }
}

/// Target of every event emitted by [`TracingLogger`].
///
/// Filter directives such as `statsd_reporter=debug` or `statsd_reporter::reporter=debug` enable debug messages
/// reported through a [`Reporter`][crate::Reporter].
pub const LOG_TARGET: &str = "statsd_reporter::reporter";

/// A [`Logger`] backed by `tracing`.
///
/// Events are emitted with the target [`LOG_TARGET`]. By default, they go to whichever dispatcher is the default for
/// the calling thread at the time of the call. A specific dispatcher can be pinned instead with
/// [`from_dispatch`][Self::from_dispatch].
#[derive(Clone, Debug, Default)]
pub struct TracingLogger {
    dispatch: Option<Dispatch>,
}

impl TracingLogger {
    /// Creates a new `TracingLogger` that uses the current default dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `TracingLogger` that always uses the given dispatcher.
    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl Logger for TracingLogger {
    fn is_enabled(&self, level: Level) -> bool {
        self.in_scope(|| match level {
            Level::ERROR => tracing::enabled!(target: LOG_TARGET, Level::ERROR),
            Level::WARN => tracing::enabled!(target: LOG_TARGET, Level::WARN),
            Level::INFO => tracing::enabled!(target: LOG_TARGET, Level::INFO),
            Level::DEBUG => tracing::enabled!(target: LOG_TARGET, Level::DEBUG),
            _ => tracing::enabled!(target: LOG_TARGET, Level::TRACE),
        })
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.in_scope(|| match level {
            Level::ERROR => tracing::error!(target: LOG_TARGET, "{}", message),
            Level::WARN => tracing::warn!(target: LOG_TARGET, "{}", message),
            Level::INFO => tracing::info!(target: LOG_TARGET, "{}", message),
            Level::DEBUG => tracing::debug!(target: LOG_TARGET, "{}", message),
            _ => tracing::trace!(target: LOG_TARGET, "{}", message),
        })
    }
}
