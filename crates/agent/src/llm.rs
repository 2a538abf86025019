use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Failures at the LLM boundary, split so callers can tell "retry later"
/// from "this response is not actionable". Transport covers network and
/// provider availability; StructuredOutput means the provider answered but
/// the content does not match the contract.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("llm transport failure: {0}")]
    Transport(String),
    #[error("llm response did not match the expected shape: {0}")]
    StructuredOutput(String),
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        (**self).complete(request).await
    }
}

/// OpenAI-compatible chat completions client. The request timeout doubles
/// as the cancellation mechanism: nothing downstream mutates state until a
/// completed response is accepted.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.user }));

        let mut builder = self.http.post(format!("{}/chat/completions", self.base_url)).json(
            &json!({
                "model": self.model,
                "temperature": request.temperature,
                "messages": messages,
            }),
        );
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response =
            builder.send().await.map_err(|err| AdapterError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Transport(format!(
                "provider returned {status}: {body}"
            )));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|err| AdapterError::Transport(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                AdapterError::StructuredOutput("completion had no message content".to_string())
            })
    }
}

/// Deterministic client for tests: pops pre-loaded responses in order.
#[derive(Default)]
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<Result<String, AdapterError>>>,
}

impl ScriptedLlmClient {
    pub fn with_responses(
        responses: impl IntoIterator<Item = Result<String, AdapterError>>,
    ) -> Self {
        Self { responses: Mutex::new(responses.into_iter().collect()) }
    }

    pub fn replying(body: impl Into<String>) -> Self {
        Self::with_responses([Ok(body.into())])
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, AdapterError> {
        let mut responses =
            self.responses.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        responses.pop_front().unwrap_or_else(|| {
            Err(AdapterError::Transport("scripted client ran out of responses".to_string()))
        })
    }
}
