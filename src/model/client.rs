//! Model client configuration

/// Default OpenAI-compatible API base
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Configuration for a model client
#[derive(Clone)]
pub struct ModelClientConfig {
    /// API base URL, without a trailing slash
    pub endpoint: String,

    /// Bearer credential; `None` makes every call fail with an auth error
    pub api_key: Option<String>,

    /// Timeout for a single request in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ModelClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ModelClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ModelClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the credential from `OPENAI_API_KEY`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
