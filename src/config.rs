use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub user_agent: String,
    /// Fetch timeout in seconds. Extraction itself is pure computation and
    /// carries no timeout.
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub empty_result_policy: EmptyResultPolicy,
}

/// What a cycle does when extraction succeeds but finds zero items: keep the
/// prior record, or swap in the empty snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResultPolicy {
    #[default]
    Retain,
    Replace,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "GARDEN_"
            .add_source(Environment::with_prefix("GARDEN").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message(
                "Server port must be greater than 0".into(),
            ));
        }

        if Url::parse(&self.source.url).is_err() {
            return Err(ConfigError::Message("Invalid source URL format".into()));
        }

        if self.source.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Source request_timeout must be greater than 0".into(),
            ));
        }

        if self.source.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Source user_agent must be set".into()));
        }

        if self.scheduler.refresh_interval_secs == 0 {
            return Err(ConfigError::Message(
                "Scheduler refresh_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
