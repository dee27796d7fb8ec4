use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use snafu::Snafu;

const MAX_KIND_LEN: usize = 63;
const MAX_NAME_LEN: usize = 1024;
const KIND_NAME_SEPARATOR: char = '/';

/// A component identifier error.
#[derive(Debug, Eq, PartialEq, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ComponentIdError {
    /// The component type was empty.
    #[snafu(display("Component type must not be empty."))]
    EmptyKind,

    /// The component type contained invalid characters or was too long.
    #[snafu(display(
        "Invalid component type '{}': must start with an ASCII letter, contain only ASCII letters, digits, or \
         underscores, and be at most 63 characters long.",
        kind
    ))]
    InvalidKind {
        /// Component type.
        kind: String,
    },

    /// A separator was present, but the name following it was empty.
    #[snafu(display("Component name must not be empty when a separator is present."))]
    EmptyName,

    /// The component name contained invalid characters or was too long.
    #[snafu(display(
        "Invalid component name '{}': must contain no whitespace or control characters, and be at most 1024 \
         characters long.",
        name
    ))]
    InvalidName {
        /// Component name.
        name: String,
    },
}

/// Identifier of a receiver instance.
///
/// Identifiers take the form `type[/name]`: the type names the kind of receiver (`statsd`), and the optional name
/// distinguishes between multiple instances of the same type (`statsd/default`, `statsd/internal`).
#[derive(Clone, Debug, DeserializeFromStr, Eq, Hash, PartialEq, SerializeDisplay)]
pub struct ComponentId {
    kind: String,
    name: Option<String>,
}

impl ComponentId {
    /// Creates a new `ComponentId` with the given type and no name.
    ///
    /// # Errors
    ///
    /// If the type is empty or not valid, an error is returned.
    pub fn new<K>(kind: K) -> Result<Self, ComponentIdError>
    where
        K: Into<String>,
    {
        let kind = kind.into();
        validate_kind(&kind)?;

        Ok(Self { kind, name: None })
    }

    /// Creates a new `ComponentId` with the given type and name.
    ///
    /// # Errors
    ///
    /// If either the type or the name is empty or not valid, an error is returned.
    pub fn with_name<K, N>(kind: K, name: N) -> Result<Self, ComponentIdError>
    where
        K: Into<String>,
        N: Into<String>,
    {
        let kind = kind.into();
        let name = name.into();
        validate_kind(&kind)?;
        validate_name(&name)?;

        Ok(Self { kind, name: Some(name) })
    }

    /// Identifier of the default StatsD receiver, `statsd`.
    pub fn statsd() -> Self {
        Self {
            kind: String::from("statsd"),
            name: None,
        }
    }

    /// Returns the component type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the component name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

fn validate_kind(kind: &str) -> Result<(), ComponentIdError> {
    if kind.is_empty() {
        return Err(ComponentIdError::EmptyKind);
    }

    let valid = kind.len() <= MAX_KIND_LEN
        && kind.starts_with(|c: char| c.is_ascii_alphabetic())
        && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ComponentIdError::InvalidKind { kind: kind.to_string() });
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), ComponentIdError> {
    if name.is_empty() {
        return Err(ComponentIdError::EmptyName);
    }

    let valid = name.chars().count() <= MAX_NAME_LEN && !name.chars().any(|c| c.is_whitespace() || c.is_control());
    if !valid {
        return Err(ComponentIdError::InvalidName { name: name.to_string() });
    }

    Ok(())
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}{}", self.kind, KIND_NAME_SEPARATOR, name),
            None => f.write_str(&self.kind),
        }
    }
}

impl FromStr for ComponentId {
    type Err = ComponentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(KIND_NAME_SEPARATOR) {
            Some((kind, name)) => Self::with_name(kind.trim(), name.trim()),
            None => Self::new(s),
        }
    }
}
