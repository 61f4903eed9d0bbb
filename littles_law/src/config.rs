use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of one multi-server queue run
///
/// Defaults reproduce the classic demonstration: one request per time unit on
/// average, four units of work each, five servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Mean time between arrivals; draws are Uniform(0, 2·mean)
    pub mean_interarrival_time: f64,
    /// Mean service duration; draws are Uniform(0, 2·mean)
    pub mean_service_time: f64,
    pub server_capacity: usize,
    /// Simulated time at which the run stops
    pub run_horizon: f64,
    /// Cadence of the queue/busy/users snapshots
    pub sampling_interval: f64,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            mean_interarrival_time: 1.0,
            mean_service_time: 4.0,
            server_capacity: 5,
            run_horizon: 1_000_000.0,
            sampling_interval: 1.0,
            seed: None,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Draws are Uniform(0, 2·mean), so twice the mean must stay finite too.
fn drawable_mean(field: &'static str, value: f64) -> Result<(), ConfigError> {
    positive(field, value)?;
    if (2.0 * value).is_finite() {
        Ok(())
    } else {
        Err(ConfigError::TooLarge { field, value })
    }
}

impl ModelConfig {
    pub fn from_toml_str(text: &str) -> Result<ModelConfig, ConfigError> {
        let config: ModelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<ModelConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ModelConfig::from_toml_str(&text)
    }

    /// Reject anything that could not describe a stable run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        drawable_mean("mean_interarrival_time", self.mean_interarrival_time)?;
        drawable_mean("mean_service_time", self.mean_service_time)?;
        positive("run_horizon", self.run_horizon)?;
        positive("sampling_interval", self.sampling_interval)?;
        self.capacity()?;
        Ok(())
    }

    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.server_capacity).ok_or(ConfigError::ZeroCapacity)
    }

    /// Offered load per server, ρ = S / (k · Ta)
    pub fn utilization(&self) -> f64 {
        self.mean_service_time / (self.server_capacity as f64 * self.mean_interarrival_time)
    }
}
