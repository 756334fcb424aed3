//! Configuration loading and validation for Labdesk.
//!
//! Everything is environment-variable driven (`LABDESK_*`), with working
//! defaults for a local deployment. Validated at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream service endpoints and timeouts
    #[serde(default)]
    pub upstreams: UpstreamConfig,

    /// Model selection per concern
    #[serde(default)]
    pub models: ModelConfig,

    /// Manager-loop and query defaults
    #[serde(default)]
    pub agent: AgentConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Base URLs and per-client timeouts for the three upstreams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Document-retrieval service (`POST /query`)
    #[serde(default = "default_retriever_url")]
    pub retriever_url: String,

    /// Grounded chat service (`POST /chat`)
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Text-generation backend (`POST /api/generate`)
    #[serde(default = "default_generate_url")]
    pub generate_url: String,

    #[serde(default = "default_retriever_timeout")]
    pub retriever_timeout_secs: u64,

    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,

    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_secs: u64,
}

fn default_retriever_url() -> String {
    "http://localhost:8080".into()
}
fn default_chat_url() -> String {
    "http://localhost:8081".into()
}
fn default_generate_url() -> String {
    "http://localhost:11434".into()
}
fn default_retriever_timeout() -> u64 {
    60
}
fn default_chat_timeout() -> u64 {
    120
}
fn default_generate_timeout() -> u64 {
    120
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            retriever_url: default_retriever_url(),
            chat_url: default_chat_url(),
            generate_url: default_generate_url(),
            retriever_timeout_secs: default_retriever_timeout(),
            chat_timeout_secs: default_chat_timeout(),
            generate_timeout_secs: default_generate_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn retriever_timeout(&self) -> Duration {
        Duration::from_secs(self.retriever_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

/// Which model serves which concern. The manager and study models
/// default to the chat model when not set explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub chat: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study: Option<String>,
}

fn default_model() -> String {
    "llama3.1".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat: default_model(),
            manager: None,
            study: None,
        }
    }
}

impl ModelConfig {
    /// The model driving the manager's decisions.
    pub fn manager_model(&self) -> &str {
        self.manager.as_deref().unwrap_or(&self.chat)
    }

    /// The model generating study guides.
    pub fn study_model(&self) -> &str {
        self.study.as_deref().unwrap_or(&self.chat)
    }
}

/// Manager-loop budget and query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool invocations per manager run
    #[serde(default = "default_budget")]
    pub budget: u32,

    /// Default number of context fragments per retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Directory where study guides are saved
    #[serde(default = "default_guides_dir")]
    pub guides_dir: PathBuf,
}

fn default_budget() -> u32 {
    4
}
fn default_top_k() -> usize {
    8
}
fn default_guides_dir() -> PathBuf {
    PathBuf::from("data/study_guides")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            top_k: default_top_k(),
            guides_dir: default_guides_dir(),
        }
    }
}

/// HTTP gateway bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8090
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstreams: UpstreamConfig::default(),
            models: ModelConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Recognised variables:
    /// - `LABDESK_RETRIEVER_URL`, `LABDESK_CHAT_URL`, `LABDESK_GENERATE_URL`
    /// - `LABDESK_CHAT_MODEL`, `LABDESK_MANAGER_MODEL`, `LABDESK_STUDY_MODEL`
    /// - `LABDESK_BUDGET`, `LABDESK_TOP_K`, `LABDESK_GUIDES_DIR`
    /// - `LABDESK_GATEWAY_HOST`, `LABDESK_GATEWAY_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LABDESK_RETRIEVER_URL") {
            config.upstreams.retriever_url = url;
        }
        if let Ok(url) = std::env::var("LABDESK_CHAT_URL") {
            config.upstreams.chat_url = url;
        }
        if let Ok(url) = std::env::var("LABDESK_GENERATE_URL") {
            config.upstreams.generate_url = url;
        }

        if let Ok(model) = std::env::var("LABDESK_CHAT_MODEL") {
            config.models.chat = model;
        }
        if let Ok(model) = std::env::var("LABDESK_MANAGER_MODEL") {
            config.models.manager = Some(model);
        }
        if let Ok(model) = std::env::var("LABDESK_STUDY_MODEL") {
            config.models.study = Some(model);
        }

        if let Some(budget) = parse_env("LABDESK_BUDGET")? {
            config.agent.budget = budget;
        }
        if let Some(top_k) = parse_env("LABDESK_TOP_K")? {
            config.agent.top_k = top_k;
        }
        if let Ok(dir) = std::env::var("LABDESK_GUIDES_DIR") {
            config.agent.guides_dir = PathBuf::from(dir);
        }

        if let Ok(host) = std::env::var("LABDESK_GATEWAY_HOST") {
            config.gateway.host = host;
        }
        if let Some(port) = parse_env("LABDESK_GATEWAY_PORT")? {
            config.gateway.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.budget == 0 {
            return Err(ConfigError::ValidationError(
                "budget must be at least 1".into(),
            ));
        }
        if self.agent.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "top_k must be at least 1".into(),
            ));
        }
        for (name, url) in [
            ("retriever_url", &self.upstreams.retriever_url),
            ("chat_url", &self.upstreams.chat_url),
            ("generate_url", &self.upstreams.generate_url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Parse an optional environment variable into `T`, reporting which
/// variable was malformed on failure.
fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.budget, 4);
        assert_eq!(config.agent.top_k, 8);
        assert_eq!(config.upstreams.retriever_url, "http://localhost:8080");
        assert_eq!(config.upstreams.generate_url, "http://localhost:11434");
    }

    #[test]
    fn manager_and_study_models_fall_back_to_chat() {
        let mut models = ModelConfig::default();
        assert_eq!(models.manager_model(), "llama3.1");
        assert_eq!(models.study_model(), "llama3.1");

        models.manager = Some("qwen2.5".into());
        assert_eq!(models.manager_model(), "qwen2.5");
        assert_eq!(models.study_model(), "llama3.1");
    }

    #[test]
    fn zero_budget_is_rejected() {
        let mut config = AppConfig::default();
        config.agent.budget = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = AppConfig::default();
        config.agent.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_url_is_rejected() {
        let mut config = AppConfig::default();
        config.upstreams.chat_url.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chat_url"));
    }

    #[test]
    fn parse_env_reports_the_variable_name() {
        std::env::set_var("LABDESK_TEST_BAD_PORT", "not-a-number");
        let err = parse_env::<u16>("LABDESK_TEST_BAD_PORT").unwrap_err();
        assert!(err.to_string().contains("LABDESK_TEST_BAD_PORT"));
        std::env::remove_var("LABDESK_TEST_BAD_PORT");
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let gateway = GatewayConfig::default();
        assert_eq!(gateway.bind_addr(), "127.0.0.1:8090");
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let upstreams = UpstreamConfig::default();
        assert_eq!(upstreams.retriever_timeout(), Duration::from_secs(60));
        assert_eq!(upstreams.chat_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent.budget, config.agent.budget);
        assert_eq!(back.upstreams.chat_url, config.upstreams.chat_url);
    }
}
