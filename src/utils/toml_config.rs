//! TOML-based configuration for the copyedit server
//!
//! All sections are optional; a missing `copyedit.toml` yields the defaults.
//! A handful of environment variables (optionally read from `.env`) override
//! the file so the service address and output location can be changed
//! without editing it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `ollama.base_url`
pub const ENV_OLLAMA_URL: &str = "COPYEDIT_OLLAMA_URL";
/// Environment variable overriding `ollama.model`
pub const ENV_MODEL: &str = "COPYEDIT_MODEL";
/// Environment variable overriding `storage.output_dir`
pub const ENV_OUTPUT_DIR: &str = "COPYEDIT_OUTPUT_DIR";

/// Root configuration structure loaded from copyedit.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyeditConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on a request body, uploads included
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============= Ollama Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Deadline for a single generation request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra attempts after a transient network failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2-8b-instruct-128k:latest".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    1
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl OllamaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============= Editor Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Chunk size threshold in characters
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Rough per-chunk latency used for the wait estimate
    #[serde(default = "default_seconds_per_chunk")]
    pub seconds_per_chunk: u64,
}

fn default_max_chunk_size() -> usize {
    4000
}

fn default_seconds_per_chunk() -> u64 {
    15
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            seconds_per_chunk: default_seconds_per_chunk(),
        }
    }
}

// ============= Storage Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the edited artifact
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("text_files")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

// ============= Jobs Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Jobs kept in memory; the oldest idle ones are forgotten beyond this
    #[serde(default = "default_max_retained_jobs")]
    pub max_retained: usize,
}

fn default_max_retained_jobs() -> usize {
    32
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_retained: default_max_retained_jobs(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CopyeditConfig {
    /// Load configuration from a TOML file, which must exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CopyeditConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if present, fall back to defaults otherwise, then apply
    /// environment overrides.
    ///
    /// Runs before logging is set up, so callers report which file was used.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.ollama.model = model;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.storage.output_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.base_url must not be empty".to_string(),
            ));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "ollama.temperature must be between 0 and 2, got {}",
                self.ollama.temperature
            )));
        }
        if self.editor.max_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "editor.max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.jobs.max_retained == 0 {
            return Err(ConfigError::ValidationError(
                "jobs.max_retained must be greater than zero".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the configuration as TOML (used by `init`)
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
