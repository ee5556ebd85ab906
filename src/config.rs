//! Service configuration
//!
//! Loaded from an optional TOML file, then overridden by `PROFILE_INSIGHT_*`
//! environment variables. Every section has defaults, so an empty file (or
//! no file) yields a runnable configuration apart from upstream credentials.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PROFILE_INSIGHT_";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub social: SocialConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Upper bound on one analysis request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct SocialConfig {
    #[serde(default = "default_social_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            base_url: default_social_base_url(),
            access_token: String::new(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_social_base_url() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_api_version() -> String {
    "5.199".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct LanguageConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_language_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            timeout_secs: default_language_timeout_secs(),
        }
    }
}

fn default_language_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
    #[serde(default = "default_half_open_max_calls")]
    pub half_open_max_calls: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_timeout_secs: default_open_timeout_secs(),
            half_open_max_calls: default_half_open_max_calls(),
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_timeout_secs() -> u64 {
    30
}

fn default_half_open_max_calls() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    1000
}

impl ResilienceConfig {
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(
            self.failure_threshold,
            Duration::from_secs(self.open_timeout_secs),
            self.half_open_max_calls,
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_step_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u64,
    /// Expiry for the in-process tier; absent = entries never expire
    #[serde(default)]
    pub local_ttl_secs: Option<u64>,
    /// Shared tier; absent = local tier only
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_ttl_secs: default_user_ttl_secs(),
            local_capacity: default_local_capacity(),
            local_ttl_secs: None,
            redis_url: None,
        }
    }
}

fn default_user_ttl_secs() -> u64 {
    600
}

fn default_local_capacity() -> u64 {
    10_000
}

impl CacheConfig {
    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_secs)
    }

    pub fn local_ttl(&self) -> Option<Duration> {
        self.local_ttl_secs.map(Duration::from_secs)
    }

    /// Redis URL if one is configured and non-blank
    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_profile_store")]
    pub profile_store: PathBuf,
    /// Snapshot root; empty disables snapshots
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profile_store: default_profile_store(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_profile_store() -> PathBuf {
    PathBuf::from("data/profiles.jsonl")
}

fn default_snapshot_dir() -> String {
    "data/snapshots".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Errors that can occur while loading configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl AppConfig {
    /// Load from `path` (if it exists) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_toml_str(&fs::read_to_string(p)?)?,
            Some(p) => {
                return Err(ConfigError::Invalid(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from `PROFILE_INSIGHT_*` variables resolved by `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("HTTP_ADDR") {
            self.http.addr = v;
        }
        if let Some(v) = var("SOCIAL_BASE_URL") {
            self.social.base_url = v;
        }
        if let Some(v) = var("SOCIAL_ACCESS_TOKEN") {
            self.social.access_token = v;
        }
        if let Some(v) = var("SOCIAL_API_VERSION") {
            self.social.api_version = v;
        }
        if let Some(v) = var("LANGUAGE_URL") {
            self.language.url = v;
        }
        if let Some(v) = var("REDIS_URL") {
            self.cache.redis_url = Some(v);
        }
        if let Some(v) = var("LANGUAGE_TOKEN") {
            self.language.token = v;
        }
        if let Some(v) = var("PROFILE_STORE") {
            self.storage.profile_store = PathBuf::from(v);
        }
        if let Some(v) = var("SNAPSHOT_DIR") {
            self.storage.snapshot_dir = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.social.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("social.base_url is empty".to_string()));
        }
        if self.language.url.trim().is_empty() {
            return Err(ConfigError::Invalid("language.url is empty".to_string()));
        }
        if self.resilience.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "resilience.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.cache.local_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache.local_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
