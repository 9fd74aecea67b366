//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    AbnormalReturnModel, EventForwardAggregator, EventWindowAggregator, EventWindowConfig,
    ExchangeClock, ForwardReturnBuilder, ForwardReturnConfig, ModelError, ReturnSeriesConfig,
    RollingConfig,
};

/// Configuration of every pipeline stage.
///
/// Fields missing from a configuration file take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Return series builder.
    pub returns: ReturnSeriesConfig,
    /// Rolling factor model.
    pub rolling: RollingConfig,
    /// Event-window aggregation.
    pub event_window: EventWindowConfig,
    /// Forward returns.
    pub forward: ForwardReturnConfig,
}

impl PipelineConfig {
    /// Read a JSON configuration file.
    ///
    /// # Errors
    /// Returns `ModelError::Io` if the file cannot be read,
    /// `ModelError::ConfigParse` if it is not valid, or the validation error.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the stages against each other.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` on the first inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.rolling.validate()?;
        if self.returns.rolling_window != self.rolling.window {
            return Err(ModelError::InvalidConfig(format!(
                "returns.rolling_window {} differs from rolling.window {}",
                self.returns.rolling_window, self.rolling.window
            )));
        }
        if self.returns.history_multiple < 1.0 {
            return Err(ModelError::InvalidConfig(format!(
                "history_multiple {} is below one window",
                self.returns.history_multiple
            )));
        }
        if self.forward.horizons.contains(&0) {
            return Err(ModelError::InvalidConfig("forward horizons start at 1 day".to_string()));
        }
        ExchangeClock::from_name(&self.event_window.exchange_timezone)?;
        Ok(())
    }

    /// Abnormal-return model for this configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the stages disagree.
    pub fn abnormal_model(&self) -> Result<AbnormalReturnModel, ModelError> {
        AbnormalReturnModel::with_config(self.returns.clone(), self.rolling.clone())
    }

    /// Event-window aggregator for this configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an unknown time zone.
    pub fn event_window_aggregator(&self) -> Result<EventWindowAggregator, ModelError> {
        EventWindowAggregator::with_config(self.event_window.clone())
    }

    /// Forward-return builder for this configuration.
    #[must_use]
    pub fn forward_builder(&self) -> ForwardReturnBuilder {
        ForwardReturnBuilder::with_config(self.forward.clone())
    }

    /// Event forward-return aggregator, sharing the event-window time zone.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an unknown time zone.
    pub fn forward_aggregator(&self) -> Result<EventForwardAggregator, ModelError> {
        let clock = ExchangeClock::from_name(&self.event_window.exchange_timezone)?;
        Ok(EventForwardAggregator::with_config(self.forward.clone(), clock))
    }
}
