use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use metrics::{Counter, Key, KeyName, Level, Metadata, NoopRecorder, Recorder, SharedString, Unit};
use snafu::Snafu;

use crate::attributes::{collect_labels, Attribute};

const MAX_INSTRUMENT_NAME_LEN: usize = 255;

/// A meter error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum MeterError {
    /// The instrument name is not valid.
    #[snafu(display("Invalid instrument name '{}': {}.", name, reason))]
    InvalidInstrumentName {
        /// Instrument name.
        name: String,

        /// Why the name was rejected.
        reason: &'static str,
    },

    /// An instrument with the same name, but a different unit or description, was already registered.
    #[snafu(display(
        "Instrument '{}' already registered with a conflicting definition (existing: {}, requested: {}).",
        name,
        existing,
        requested
    ))]
    ConflictingInstrument {
        /// Instrument name.
        name: &'static str,

        /// Descriptor of the instrument that was registered first.
        existing: InstrumentDescriptor,

        /// Descriptor of the instrument that was rejected.
        requested: InstrumentDescriptor,
    },
}

/// Describes an instrument to register with a [`Meter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InstrumentDescriptor {
    name: &'static str,
    description: &'static str,
    unit: Unit,
}

impl InstrumentDescriptor {
    /// Creates a new `InstrumentDescriptor` with the given name.
    ///
    /// The description defaults to being empty, and the unit defaults to [`Unit::Count`].
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            unit: Unit::Count,
        }
    }

    /// Sets the description of the instrument.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit of the instrument.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Returns the instrument name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the instrument description.
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the instrument unit.
    pub const fn unit(&self) -> Unit {
        self.unit
    }
}

impl fmt::Display for InstrumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [unit={}, description=\"{}\"]",
            self.name,
            self.unit.as_str(),
            self.description
        )
    }
}

fn validate_name(name: &str) -> Result<(), MeterError> {
    let reason = if name.is_empty() {
        Some("name must not be empty")
    } else if name.len() > MAX_INSTRUMENT_NAME_LEN {
        Some("name must be at most 255 characters")
    } else if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        Some("name must start with an ASCII letter")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
    {
        Some("name may only contain ASCII letters, digits, or one of `_`, `.`, `-`, `/`")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(MeterError::InvalidInstrumentName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn registration_metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

struct Inner {
    recorder: Arc<dyn Recorder + Send + Sync>,
    instruments: Mutex<HashMap<&'static str, InstrumentDescriptor>>,
}

/// Factory for instruments.
///
/// A `Meter` wraps a [`Recorder`], which acts as the metrics backend, and keeps track of every instrument registered
/// through it so that conflicting registrations can be rejected up front rather than silently producing a mix of
/// incompatible series.
///
/// `Meter` is cheap to clone, and all clones share the same recorder and instrument registry.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<Inner>,
}

impl Meter {
    /// Creates a new `Meter` backed by the given recorder.
    pub fn new<R>(recorder: R) -> Self
    where
        R: Recorder + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                recorder: Arc::new(recorder),
                instruments: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a new `Meter` that discards everything recorded through it.
    pub fn noop() -> Self {
        Self::new(NoopRecorder)
    }

    /// Registers a cumulative, monotonically increasing counter.
    ///
    /// Registering a descriptor identical to one already registered through this meter returns another handle to the
    /// same instrument.
    ///
    /// # Errors
    ///
    /// If the instrument name is invalid, or an instrument with the same name but a different unit or description has
    /// already been registered, an error is returned.
    pub fn u64_counter(&self, descriptor: InstrumentDescriptor) -> Result<CounterInstrument, MeterError> {
        validate_name(descriptor.name())?;

        {
            let mut instruments = self.inner.instruments.lock().unwrap_or_else(PoisonError::into_inner);
            match instruments.get(descriptor.name()) {
                Some(existing) if *existing != descriptor => {
                    return Err(MeterError::ConflictingInstrument {
                        name: descriptor.name(),
                        existing: *existing,
                        requested: descriptor,
                    });
                }
                Some(_) => {}
                None => {
                    instruments.insert(descriptor.name(), descriptor);
                }
            }
        }

        let name = KeyName::from_const_str(descriptor.name());
        self.inner.recorder.describe_counter(
            name.clone(),
            Some(descriptor.unit()),
            SharedString::const_str(descriptor.description()),
        );

        Ok(CounterInstrument {
            name,
            recorder: Arc::clone(&self.inner.recorder),
        })
    }
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instruments = self.inner.instruments.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Meter")
            .field("instruments", &instruments.len())
            .finish_non_exhaustive()
    }
}

/// A registered counter instrument.
///
/// Each distinct set of attributes passed to the instrument identifies its own series.
#[derive(Clone)]
pub struct CounterInstrument {
    name: KeyName,
    recorder: Arc<dyn Recorder + Send + Sync>,
}

impl CounterInstrument {
    /// Returns the instrument name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Resolves the series identified by `attributes`, returning a handle that can be incremented directly.
    pub fn bind<I>(&self, attributes: I) -> Counter
    where
        I: IntoIterator<Item = Attribute>,
    {
        let key = Key::from_parts(self.name.clone(), collect_labels(attributes));
        self.recorder.register_counter(&key, &registration_metadata())
    }
}

impl fmt::Debug for CounterInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterInstrument").field("name", &self.name).finish()
    }
}
