//! Configuration management for the enrollment assistant
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (ENROLLMENT_AGENT__ prefix)
//!
//! Lead scoring weights and thresholds can additionally be loaded from a
//! standalone YAML document via [`ScoringConfig::load`].

pub mod scoring;
pub mod settings;

pub use scoring::{
    GradeBand, InstitutionScoring, ParentScoring, ScoringConfig, ScoringConfigError,
    TemperatureThresholds,
};
pub use settings::{
    load_settings, ConversationConfig, ObservabilityConfig, PersistenceBackend,
    PersistenceConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ScoringConfigError> for ConfigError {
    fn from(err: ScoringConfigError) -> Self {
        match err {
            ScoringConfigError::FileNotFound(path, _) => ConfigError::FileNotFound(path),
            ScoringConfigError::ParseError(message) => ConfigError::ParseError(message),
        }
    }
}
