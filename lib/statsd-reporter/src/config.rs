use receiver_config::{ConfigurationError, GenericConfiguration};
use receiver_metrics::Meter;
use serde::Deserialize;

use crate::{ComponentId, Logger, Reporter, ReporterError, ReporterSettings};

fn default_receiver_id() -> ComponentId {
    ComponentId::statsd()
}

/// Reporter configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ReporterConfiguration {
    /// Identifier of the receiver instance.
    ///
    /// Attached to every counter update as the `receiver` attribute. Takes the form `type[/name]`.
    ///
    /// Defaults to `statsd`.
    #[serde(default = "default_receiver_id")]
    receiver_id: ComponentId,
}

impl ReporterConfiguration {
    /// Creates a new `ReporterConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration contains a value for `receiver_id` that is not a valid identifier, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, ConfigurationError> {
        config.as_typed()
    }

    /// Returns the configured receiver identifier.
    pub fn receiver_id(&self) -> &ComponentId {
        &self.receiver_id
    }

    /// Builds a [`Reporter`] from this configuration.
    ///
    /// # Errors
    ///
    /// If the counter instrument cannot be registered with the meter, an error is returned.
    pub fn build<L>(&self, logger: L, meter: &Meter) -> Result<Reporter<L>, ReporterError>
    where
        L: Logger,
    {
        let settings = ReporterSettings::new(self.receiver_id.clone(), meter.clone()).with_logger(logger);
        Reporter::new(settings)
    }
}

impl Default for ReporterConfiguration {
    fn default() -> Self {
        Self {
            receiver_id: default_receiver_id(),
        }
    }
}
