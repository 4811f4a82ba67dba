//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConfigError, ScoringConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation pacing
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Lead scoring weights and thresholds
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Lead storage backend
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_conversation()?;
        self.validate_persistence()?;
        self.scoring.validate()?;

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Max sessions must be at least 1".to_string(),
            });
        }

        if server.session_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.session_timeout_seconds".to_string(),
                message: "Session timeout must be at least 1 second".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        // Wildcard CORS is only acceptable outside production
        if self.environment.is_production()
            && server.cors_enabled
            && server.cors_origins.iter().any(|o| o == "*")
        {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_origins".to_string(),
                message: "Wildcard origin is not allowed in production".to_string(),
            });
        }

        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        if self.conversation.reply_delay_ms > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.reply_delay_ms".to_string(),
                message: format!(
                    "Reply delay too high (maximum 10000ms), got {}",
                    self.conversation.reply_delay_ms
                ),
            });
        }

        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        if self.persistence.backend == PersistenceBackend::JsonFile
            && self.persistence.path.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                field: "persistence.path".to_string(),
                message: "A file path is required for the json_file backend".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum live conversations held by the session registry
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a conversation is dropped
    #[serde(default = "default_session_timeout")]
    pub session_timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins (empty = localhost only)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            max_sessions: default_max_sessions(),
            session_timeout_seconds: default_session_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Conversation pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Composing delay before an assistant reply is released
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

impl ConversationConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

/// Where completed leads are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    #[default]
    Memory,
    /// JSON array document on disk
    JsonFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,

    /// Lead file for the json_file backend
    #[serde(default = "default_leads_path")]
    pub path: String,

    /// Number of analytics events retained in memory
    #[serde(default = "default_analytics_capacity")]
    pub analytics_capacity: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            path: default_leads_path(),
            analytics_capacity: default_analytics_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_max_sessions() -> usize {
    1000
}
fn default_session_timeout() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}
fn default_reply_delay_ms() -> u64 {
    800
}
fn default_leads_path() -> String {
    "data/leads.json".to_string()
}
fn default_analytics_capacity() -> usize {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (ENROLLMENT_AGENT__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("ENROLLMENT_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        backend = ?settings.persistence.backend,
        "Settings loaded"
    );

    Ok(settings)
}
