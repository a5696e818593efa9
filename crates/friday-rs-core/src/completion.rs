//! Chat-completion client for OpenAI-compatible endpoints.

use async_trait::async_trait;
use friday_rs_config::CompletionConfig;
use friday_rs_protocol::{ConversationTurn, DocumentRef};
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Request body sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// Windowed view of the session history.
    pub messages: Vec<ConversationTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub documents: Vec<DocumentRef>,
}

/// Failures of a single completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(String),
    /// Connection or transfer failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// No response within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-success HTTP status.
    #[error("endpoint rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// Success status without `choices[0].message.content`.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Sends one completion request and returns the reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `reqwest`-backed client with bearer auth and a request timeout.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CompletionError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Client for the endpoint and timeout in `config`.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        debug!(
            "sending completion request (model={}, messages={}, documents={})",
            request.model,
            request.messages.len(),
            request.documents.len()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.map_send_error(err))?;

        if !status.is_success() {
            error!(
                "completion endpoint rejected request (status={}, body={})",
                status.as_u16(),
                body
            );
            return Err(CompletionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|err| {
            warn!("completion response is not valid json (error={})", err);
            CompletionError::Malformed(err.to_string())
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CompletionError::Malformed("missing choices[0].message.content".into()))
    }
}
