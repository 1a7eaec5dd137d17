//! Chat-completion client with bounded retries and linear backoff.
//!
//! The client is stateless: conversation history is passed in and returned
//! as a value, never stored, so independent conversations can run
//! concurrently against one client. Attempts are strictly sequential — one
//! in flight at a time — with a per-attempt timeout and a growing sleep
//! between failures (2s, 4s, 6s, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::config::AnalysisConfig;
use super::conversation::{Conversation, Message};

/// Chat-completion request (OpenAI-compatible wire format).
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// Chat-completion response. Only the first choice is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Failure of a single endpoint attempt. All classes are transient and
/// subject to retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Errors surfaced by [`AnalysisClient::analyze`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no text to analyze")]
    EmptyInput,

    #[error("analysis failed after {attempts} attempts: {cause}")]
    RetriesExhausted { attempts: u32, cause: AttemptError },
}

/// A remote chat-completion endpoint.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AttemptError>;
}

/// HTTP endpoint speaking the OpenAI-compatible chat-completions protocol
/// with bearer-token authentication.
pub struct HttpEndpoint {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpEndpoint {
    pub fn new(config: &AnalysisConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ChatEndpoint for HttpEndpoint {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AttemptError> {
        let mut req = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Timeout
            } else {
                AttemptError::Transport(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AttemptError::Transport(format!("HTTP {}: {}", status, body)));
        }

        resp.json()
            .await
            .map_err(|e| AttemptError::Unexpected(format!("malformed response: {}", e)))
    }
}

/// Document analysis client.
pub struct AnalysisClient {
    config: AnalysisConfig,
    endpoint: std::sync::Arc<dyn ChatEndpoint>,
}

impl AnalysisClient {
    /// Create a client talking to the configured HTTP endpoint.
    pub fn new(config: AnalysisConfig) -> Self {
        let endpoint = std::sync::Arc::new(HttpEndpoint::new(&config));
        Self { config, endpoint }
    }

    /// Create a client over a custom endpoint.
    pub fn with_endpoint(config: AnalysisConfig, endpoint: std::sync::Arc<dyn ChatEndpoint>) -> Self {
        Self { config, endpoint }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `text`, threading `prior` conversation state when present.
    ///
    /// The opening turn wraps the document in the configured analysis
    /// prompt; follow-up turns send the text as-is. On success the returned
    /// conversation carries the new user and assistant turns.
    pub async fn analyze(
        &self,
        text: &str,
        prior: Option<Conversation>,
    ) -> Result<(String, Conversation), AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let messages = match prior {
            None => {
                let content = self
                    .config
                    .get_document_prompt()
                    .replace("{content}", self.truncate_content(text));
                Conversation::opening(self.config.get_system_prompt(), &content)
            }
            Some(mut conversation) => {
                conversation.push_user(self.truncate_content(text));
                conversation
            }
        };

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.messages().to_vec(),
        };

        let max_retries = self.config.max_retries.max(1);
        let mut last_error = AttemptError::Unexpected("no attempts made".to_string());

        for attempt in 0..max_retries {
            debug!("analysis request attempt {}/{}", attempt + 1, max_retries);

            match timeout(self.config.timeout(), self.endpoint.send(&request)).await {
                Err(_) => {
                    warn!("attempt {}: request timed out", attempt + 1);
                    last_error = AttemptError::Timeout;
                }
                Ok(Err(e)) => {
                    warn!("attempt {}: {}", attempt + 1, e);
                    last_error = e;
                }
                Ok(Ok(response)) => match reply_text(&response) {
                    Some(reply) => {
                        let mut state = messages;
                        state.push_assistant(&reply);
                        return Ok((reply, state));
                    }
                    None => {
                        warn!("attempt {}: response carried no reply content", attempt + 1);
                        last_error =
                            AttemptError::Unexpected("response carried no reply content".to_string());
                    }
                },
            }

            // Linear backoff before the next attempt: 2s, 4s, 6s, ...
            if attempt + 1 < max_retries {
                let wait = Duration::from_secs(u64::from(attempt + 1) * 2);
                debug!("retrying in {:?}", wait);
                sleep(wait).await;
            }
        }

        Err(AnalysisError::RetriesExhausted {
            attempts: max_retries,
            cause: last_error,
        })
    }

    /// Truncate content to the configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }
}

/// First choice's reply content, if present and non-empty.
fn reply_text(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::conversation::Role;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    enum Step {
        Reply(&'static str),
        Empty,
        Fail(AttemptError),
        Hang,
    }

    struct ScriptedEndpoint {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedEndpoint {
        fn new(script: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatEndpoint for ScriptedEndpoint {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatResponse, AttemptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Reply(text)) => Ok(ChatResponse {
                    choices: vec![Choice {
                        message: ChoiceMessage {
                            content: Some(text.to_string()),
                        },
                    }],
                }),
                Some(Step::Empty) => Ok(ChatResponse { choices: vec![] }),
                Some(Step::Fail(e)) => Err(e),
                Some(Step::Hang) | None => {
                    // Outlives any per-attempt timeout.
                    sleep(Duration::from_secs(86400)).await;
                    Err(AttemptError::Unexpected("unreachable".to_string()))
                }
            }
        }
    }

    fn client_with(script: Vec<Step>) -> (AnalysisClient, Arc<ScriptedEndpoint>) {
        let endpoint = ScriptedEndpoint::new(script);
        let client = AnalysisClient::with_endpoint(AnalysisConfig::default(), endpoint.clone());
        (client, endpoint)
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_attempts() {
        let (client, endpoint) = client_with(vec![Step::Reply("unused")]);
        let err = client.analyze("   ", None).await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_linear_backoff_then_succeeds() {
        let (client, endpoint) = client_with(vec![
            Step::Fail(AttemptError::Transport("connection reset".to_string())),
            Step::Fail(AttemptError::Transport("connection reset".to_string())),
            Step::Reply("the summary"),
        ]);

        let start = tokio::time::Instant::now();
        let (reply, state) = client.analyze("document text", None).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(reply, "the summary");
        assert_eq!(endpoint.calls(), 3);
        // Two waits on the linear schedule: 2s + 4s.
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_secs(7));

        let roles: Vec<Role> = state.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_followup_appends_one_user_and_one_assistant_turn() {
        let (client, _) = client_with(vec![Step::Reply("first")]);
        let (_, prior) = client.analyze("document text", None).await.unwrap();
        assert_eq!(prior.len(), 3);

        let (client, _) = client_with(vec![Step::Reply("second")]);
        let (reply, state) = client
            .analyze("a follow-up question", Some(prior.clone()))
            .await
            .unwrap();

        assert_eq!(reply, "second");
        assert_eq!(state.len(), prior.len() + 2);
        assert_eq!(state.messages()[3].role, Role::User);
        assert_eq!(state.messages()[3].content, "a follow-up question");
        assert_eq!(state.messages()[4].role, Role::Assistant);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_carry_last_cause() {
        let (client, endpoint) = client_with(vec![
            Step::Fail(AttemptError::Transport("boom".to_string())),
            Step::Fail(AttemptError::Transport("boom".to_string())),
            Step::Fail(AttemptError::Unexpected("bad json".to_string())),
        ]);

        let err = client.analyze("document text", None).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::RetriesExhausted {
                attempts: 3,
                cause: AttemptError::Unexpected("bad json".to_string()),
            }
        );
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_attempt_timeout() {
        let (client, endpoint) = client_with(vec![Step::Hang, Step::Hang, Step::Hang]);

        let start = tokio::time::Instant::now();
        let err = client.analyze("document text", None).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(
            err,
            AnalysisError::RetriesExhausted {
                attempts: 3,
                cause: AttemptError::Timeout,
            }
        );
        assert_eq!(endpoint.calls(), 3);
        // Three 30s attempt timeouts plus 2s + 4s of backoff.
        assert!(elapsed >= Duration::from_secs(96));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_success_is_retried() {
        let (client, endpoint) = client_with(vec![Step::Empty, Step::Reply("recovered")]);

        let (reply, _) = client.analyze("document text", None).await.unwrap();
        assert_eq!(reply, "recovered");
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn test_opening_turn_wraps_document_prompt() {
        let (client, _) = client_with(vec![Step::Reply("ok")]);
        let (_, state) = client.analyze("the document body", None).await.unwrap();

        assert!(state.messages()[1].content.contains("the document body"));
        assert!(state.messages()[1]
            .content
            .starts_with("Analyze the following document:"));
    }

    #[tokio::test]
    async fn test_content_truncation_is_utf8_safe() {
        let config = AnalysisConfig {
            max_content_chars: 5,
            ..AnalysisConfig::default()
        };
        let endpoint = ScriptedEndpoint::new(vec![Step::Reply("ok")]);
        let client = AnalysisClient::with_endpoint(config, endpoint);

        // 'é' is two bytes; the cut lands inside it and must back off.
        let (_, state) = client.analyze("abcdé rest", None).await.unwrap();
        assert!(state.messages()[1].content.contains("abcd"));
        assert!(!state.messages()[1].content.contains("é"));
    }
}
