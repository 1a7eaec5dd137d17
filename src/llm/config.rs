//! Analysis client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default system prompt for document analysis.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a document analysis assistant. Read the provided text carefully and analyze it in detail: summarize the content, call out key facts, dates, names and figures, and note anything unusual or incomplete.";

/// Default prompt wrapping the extracted document text on the opening turn
/// (uses a {content} placeholder).
pub const DEFAULT_DOCUMENT_PROMPT: &str = "Analyze the following document:\n\n{content}";

/// Configuration for the analysis client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Chat-completions API base (an OpenAI-compatible /chat/completions
    /// path is appended)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token for the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model to request
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum attempts per analysis call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Timeout per attempt, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum characters of document content to send
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Custom system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Custom opening-turn prompt (uses a {content} placeholder)
    #[serde(default)]
    pub document_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_content_chars() -> usize {
    12000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            max_content_chars: default_max_content_chars(),
            system_prompt: None,
            document_prompt: None,
        }
    }
}

impl AnalysisConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `ANALYSIS_ENDPOINT`: API base URL
    /// - `ANALYSIS_API_KEY` (or `DEEPSEEK_API_KEY`): bearer token
    /// - `ANALYSIS_MODEL`: model name
    /// - `ANALYSIS_MAX_RETRIES`: attempts per call
    /// - `ANALYSIS_TIMEOUT_SECS`: per-attempt timeout
    /// - `ANALYSIS_MAX_CONTENT_CHARS`: max document chars to send
    /// - `ANALYSIS_SYSTEM_PROMPT`: custom system prompt
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("ANALYSIS_ENDPOINT") {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var("ANALYSIS_API_KEY") {
            self.api_key = Some(val);
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("DEEPSEEK_API_KEY").ok();
        }
        if let Ok(val) = std::env::var("ANALYSIS_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("ANALYSIS_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                self.max_retries = n;
            }
        }
        if let Ok(val) = std::env::var("ANALYSIS_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("ANALYSIS_MAX_CONTENT_CHARS") {
            if let Ok(n) = val.parse() {
                self.max_content_chars = n;
            }
        }
        if let Ok(val) = std::env::var("ANALYSIS_SYSTEM_PROMPT") {
            self.system_prompt = Some(val);
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the system prompt, using custom or default.
    pub fn get_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Get the opening-turn prompt, using custom or default.
    pub fn get_document_prompt(&self) -> &str {
        self.document_prompt
            .as_deref()
            .unwrap_or(DEFAULT_DOCUMENT_PROMPT)
    }
}
