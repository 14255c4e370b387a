//! Chat-completion client (OpenAI-compatible `/v1/chat/completions`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::stop::truncate_at_stop;

/// Chat-completion endpoint used unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1/chat/completions";

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V2.5";

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "CUSTOM_API_KEY";

/// Credential used when `CUSTOM_API_KEY` is not set.
pub const PLACEHOLDER_API_KEY: &str = "sk-xxx";

/// Default upper bound on one outbound call, connect through last body byte.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Maximum number of characters of a remote error body kept in errors.
const ERROR_BODY_LIMIT: usize = 500;

/// One completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Remote model identifier.
    pub model: String,
    /// Fully assembled prompt, sent as the single user message.
    pub prompt: String,
    /// Reply is cut at the first of these; never sent to the endpoint.
    pub stop: Vec<String>,
}

/// Anything that can turn a prompt into model text.
pub trait Completer: Send + Sync {
    /// Perform exactly one completion. Blocks until the reply or an error.
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Connection settings for [`ChatCompletionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config for the default endpoint and timeout.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 1],
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Blocking client for an OpenAI-compatible chat-completion endpoint.
///
/// Cheap to share: the underlying agent is reference counted. Call it from a
/// blocking context (`spawn_blocking` inside async code).
pub struct ChatCompletionClient {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl ChatCompletionClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST the request and return the raw response body on 2xx.
    fn send(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model,
            messages: [ApiMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .agent
            .post(&self.config.base_url)
            .header("accept", "application/json")
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .send_json(&body)
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(CompletionError::Remote {
                status: status.as_u16(),
                body: truncate(&text, ERROR_BODY_LIMIT),
            });
        }

        Ok(text)
    }

    fn transport_error(&self, error: ureq::Error) -> CompletionError {
        match error {
            ureq::Error::Timeout(_) => CompletionError::Timeout(self.config.timeout),
            other => CompletionError::Transport(other.to_string()),
        }
    }
}

impl Completer for ChatCompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "requesting chat completion"
        );

        let text = self.send(&request.model, &request.prompt)?;
        let content = first_choice_content(&text)?;

        if request.stop.is_empty() {
            Ok(content)
        } else {
            Ok(truncate_at_stop(&content, &request.stop).to_string())
        }
    }
}

/// Pull `choices[0].message.content` out of a response body.
fn first_choice_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        CompletionError::MalformedReply(format!(
            "{}. Response was: {}",
            e,
            truncate(body, ERROR_BODY_LIMIT)
        ))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            CompletionError::MalformedReply("response contained no choice content".to_string())
        })
}

/// Truncate a string to `max` characters for error messages.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
