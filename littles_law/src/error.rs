//! Error types for the queue model

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} = {value} is too large to draw Uniform(0, 2·{field}) from")]
    TooLarge { field: &'static str, value: f64 },

    #[error("server_capacity must be at least 1")]
    ZeroCapacity,

    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("simulation engine: {0}")]
    Engine(#[from] des::Error),

    /// The arrival generator never stops, so running dry means the model is broken
    #[error("event queue ran dry at t={at} before the horizon")]
    Exhausted { at: f64 },

    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("replication {index}: {source}")]
    Replication {
        index: usize,
        source: des::parallel::ScenarioError,
    },
}
