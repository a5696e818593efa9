use async_trait::async_trait;
use friday_rs_core::{CompletionClient, CompletionError, CompletionRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Completion client that replays queued results and records every call.
///
/// When the queue runs dry it answers with `fallback`.
#[derive(Debug, Default)]
pub struct RecordingCompletion {
    queued: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: String,
    requests: Mutex<Vec<CompletionRequest>>,
    api_keys: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            ..Self::default()
        }
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, content: impl Into<String>) {
        self.queued.lock().push_back(Ok(content.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: CompletionError) {
        self.queued.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl CompletionClient for RecordingCompletion {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        self.requests.lock().push(request.clone());
        self.api_keys.lock().push(api_key.to_string());
        let next = self.queued.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Completion client that fails every call with a rejected status.
#[derive(Debug, Clone)]
pub struct FailingCompletion {
    status: u16,
}

impl FailingCompletion {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(
        &self,
        _api_key: &str,
        _request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::Rejected {
            status: self.status,
            body: "stub failure".to_string(),
        })
    }
}
