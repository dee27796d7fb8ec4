//! Metrics primitives for receiver self-telemetry.
//!
//! This crate provides a thin, explicit layer over the [`metrics`] crate: a [`Meter`] wraps an injected
//! [`metrics::Recorder`] and hands out instruments, validating instrument definitions as they are registered. Nothing
//! in this crate touches the global recorder.
#![deny(missing_docs)]

mod attributes;
pub use self::attributes::Attribute;

mod meter;
pub use self::meter::{CounterInstrument, InstrumentDescriptor, Meter, MeterError};


pub use metrics::Unit;
