//! Primitives for loading typed configuration data.
#![deny(missing_docs)]

use std::{path::Path, sync::Arc};

use figment::{error::Kind, providers::Env, Figment, Profile, Provider};
use serde::Deserialize;
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod provider;
use self::provider::ResolvedProvider;

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// A field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        ///
        /// This is a period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to load configuration: {}", source))]
    Generic {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual_ty, expected_ty) => Self::InvalidFieldType {
                field: e.path.join("."),
                expected_ty,
                actual_ty: actual_ty.to_string(),
            },
            _ => Self::Generic { source: e },
        }
    }
}

/// A configuration loader that can pull from various sources.
///
/// Sources have an implicit priority based on the order in which they are added: sources added later take precedence
/// over sources added earlier.
///
/// # Supported sources
///
/// - YAML file
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
#[derive(Default)]
pub struct ConfigurationLoader {
    providers: Vec<ResolvedProvider>,
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid YAML, an error will be returned.
    pub fn from_yaml<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let resolved_provider = ResolvedProvider::from_yaml(&path).context(Generic)?;
        self.providers.push(resolved_provider);
        Ok(self)
    }

    /// Loads configuration from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `app`, any environment variable starting with `APP_` would be matched. Nested keys are not supported:
    /// `APP_RECEIVER_ID` maps to the top-level key `receiver_id`.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the environment could not be read, an error will be returned.
    pub fn from_environment(mut self, prefix: &'static str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        // The environment is snapshotted now, so later changes to it are not observed.
        let mut values = Env::prefixed(&prefix).data().context(Generic)?;
        match values.remove(&Profile::Default) {
            Some(dict) if !dict.is_empty() => self
                .providers
                .push(ResolvedProvider::from_dict("environment variables", dict)),
            _ => debug!(prefix = %prefix, "No environment variables found with prefix."),
        }
        Ok(self)
    }

    /// Consumes the configuration loader and wraps it in a generic wrapper.
    pub fn into_generic(self) -> GenericConfiguration {
        let figment = self
            .providers
            .iter()
            .fold(Figment::new(), |figment, provider| figment.admerge(provider));
        GenericConfiguration {
            figment: Arc::new(figment),
        }
    }
}

/// A generic configuration object.
///
/// This represents the merged configuration derived from [`ConfigurationLoader`]. Components extract their own typed
/// view of it with [`as_typed`][Self::as_typed].
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    figment: Arc<Figment>,
}

impl GenericConfiguration {
    /// Attempts to deserialize the entire configuration as `T`.
    ///
    /// ## Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn as_typed<'a, T>(&self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        Ok(self.figment.extract()?)
    }
}
