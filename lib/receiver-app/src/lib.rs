//! High-level application primitives.
//!
//! This crate provides common primitives necessary for bootstrapping a receiver application prior to running, such as
//! initializing logging.
#![deny(missing_docs)]

pub mod logging;

/// A generic error type.
///
/// Used at the application boundary, where errors from many different crates meet and only need to be reported.
pub type GenericError = anyhow::Error;

/// Common imports.
pub mod prelude {
    pub use super::logging::{fatal_and_exit, initialize_logging};
    pub use super::GenericError;
}

/// Macro for constructing a generic error.
///
/// The resulting value evaluates to [`GenericError`], and can be constructed from a string literal, a format string
/// (with arguments accepted, in the same order as `std::format!`), or an existing error value.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;
