use docshelf_core::RetryStrategy;

/// Configuration for the HTTP classification client.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// OpenAI-compatible chat-completions endpoint
    /// (e.g. `https://api.groq.com/openai/v1/chat/completions`).
    pub endpoint: String,
    /// Model to use (e.g. `llama-3.3-70b-versatile`).
    pub model: String,
    /// API key for authentication.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Temperature for sampling. Zero keeps classification deterministic.
    pub temperature: f64,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Backoff curve between retry attempts.
    pub retry: RetryStrategy,
}

impl ClassifierConfig {
    /// Create a config with the given endpoint, model, and API key.
    ///
    /// Defaults: 30s timeout, temperature 0.0, 512 max tokens, 2 retries
    /// with exponential backoff.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_seconds: 30,
            temperature: 0.0,
            max_tokens: 512,
            max_retries: 2,
            retry: RetryStrategy::default(),
        }
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the number of retries for transient failures.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff curve between retries.
    #[must_use]
    pub fn with_retry_strategy(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }
}
