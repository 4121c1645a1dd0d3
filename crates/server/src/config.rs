use serde::Deserialize;
use thiserror::Error;

/// A configuration problem that prevents startup.
///
/// This is the only error class that is allowed to stop the process; every
/// runtime failure downstream is retried, degraded around, or folded into a
/// per-file outcome instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting has no value.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has a value outside its valid range.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Top-level configuration for the docshelf server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct DocshelfConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote storage (Drive API) configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// LLM classification configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Organizing pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Push-notification subscription configuration.
    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

impl DocshelfConfig {
    /// Overlay secrets from the environment.
    ///
    /// `DOCSHELF_STORAGE_TOKEN` and `DOCSHELF_LLM_API_KEY` take precedence
    /// over the TOML values, so config files can be committed without keys.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("DOCSHELF_STORAGE_TOKEN") {
            self.storage.token = token;
        }
        if let Ok(key) = std::env::var("DOCSHELF_LLM_API_KEY") {
            self.llm.api_key = key;
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.token.is_empty() {
            return Err(ConfigError::Missing(
                "storage.token (or DOCSHELF_STORAGE_TOKEN)",
            ));
        }
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::Missing("llm.api_key (or DOCSHELF_LLM_API_KEY)"));
        }
        if !(0.0..=1.0).contains(&self.pipeline.confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "pipeline.confidence_threshold",
                reason: "must be between 0 and 1",
            });
        }
        if self.subscription.lease_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "subscription.lease_seconds",
                reason: "must be positive",
            });
        }
        if self.subscription.renewal_margin_seconds >= self.subscription.lease_seconds {
            return Err(ConfigError::Invalid {
                field: "subscription.renewal_margin_seconds",
                reason: "must be shorter than the lease",
            });
        }
        if self.subscription.poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "subscription.poll_interval_seconds",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown timeout in seconds.
    ///
    /// Maximum time to wait for the organize worker and background tasks to
    /// wind down after the listener stops accepting requests.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Remote storage (Drive API) configuration.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the Drive-style API.
    #[serde(default = "default_storage_base_url")]
    pub base_url: String,
    /// OAuth bearer token for API requests.
    ///
    /// Usually supplied via `DOCSHELF_STORAGE_TOKEN` rather than the file.
    #[serde(default)]
    pub token: String,
    /// Identifier of the watched folder. `"root"` is the account root.
    #[serde(default = "default_root")]
    pub root: String,
    /// Request timeout in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_base_url(),
            token: String::new(),
            root: default_root(),
            timeout_seconds: default_storage_timeout(),
        }
    }
}

fn default_storage_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_owned()
}

fn default_root() -> String {
    "root".to_owned()
}

fn default_storage_timeout() -> u64 {
    30
}

/// LLM classification configuration.
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model to use.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key for authentication.
    ///
    /// Usually supplied via `DOCSHELF_LLM_API_KEY` rather than the file.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// Temperature for LLM sampling. Zero keeps classification repeatable.
    pub temperature: Option<f64>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
    /// Retries after the first attempt for transient failures.
    pub max_retries: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            timeout_seconds: None,
            temperature: None,
            max_tokens: None,
            max_retries: None,
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_owned()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_owned()
}

/// Organizing pipeline tuning.
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    /// Minimum classification confidence for filing into the proposed
    /// category; anything below routes to `Needs Review`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Maximum characters of extracted content sent to the classifier.
    #[serde(default = "default_content_cap")]
    pub content_cap: usize,
    /// Pause between files during a batch sweep, in milliseconds.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
    /// Per-file download timeout in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            content_cap: default_content_cap(),
            batch_delay_ms: default_batch_delay(),
            download_timeout_seconds: default_download_timeout(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    docshelf_core::DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_content_cap() -> usize {
    docshelf_core::DEFAULT_CONTENT_CAP
}

fn default_batch_delay() -> u64 {
    500
}

fn default_download_timeout() -> u64 {
    60
}

/// Push-notification subscription configuration.
#[derive(Debug, Deserialize)]
pub struct SubscriptionConfig {
    /// Public HTTPS address the provider delivers notifications to.
    ///
    /// Leave empty to skip channel registration and rely on polling alone.
    #[serde(default)]
    pub address: String,
    /// Requested channel lease in seconds.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// How long before expiry renewal runs, in seconds.
    #[serde(default = "default_renewal_margin")]
    pub renewal_margin_seconds: u64,
    /// Safety-net polling interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            lease_seconds: default_lease(),
            renewal_margin_seconds: default_renewal_margin(),
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

fn default_lease() -> u64 {
    docshelf_ingest::DEFAULT_LEASE_SECONDS
}

fn default_renewal_margin() -> u64 {
    docshelf_ingest::DEFAULT_RENEWAL_MARGIN_SECONDS
}

fn default_poll_interval() -> u64 {
    docshelf_ingest::DEFAULT_POLL_INTERVAL_SECONDS
}
