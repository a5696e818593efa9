//! Conversation session: history, request cycle, and reply delivery.

use crate::completion::{CompletionClient, CompletionError, CompletionRequest, HttpCompletionClient};
use crate::dispatch::OutputDispatcher;
use crate::documents::build_documents;
use crate::error::FridayCoreError;
use crate::fallback::ReplyKind;
use crate::prompt::PromptBuilder;
use crate::reply::ReplyParser;
use friday_rs_config::{FridayConfig, MAX_RECENT_MESSAGES, MAX_SUMMARY_TOP_TOPICS};
use friday_rs_memory::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, LongTermMemory, MemoryEvent,
    MemoryPolicy,
};
use friday_rs_protocol::{
    ConversationTurn, ParsedReply, SpeechSink, StudySource, TranscriptSink, UserContext,
    UserProfile,
};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use uuid::Uuid;

/// Whether the session has sent its system prompt yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No system turn yet.
    Idle,
    /// System turn inserted; history is accumulating.
    Active,
}

/// Result of processing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Structured reply that was dispatched.
    pub reply: ParsedReply,
    /// Raw reply text, as recorded in memory.
    pub raw: String,
    pub kind: ReplyKind,
}

/// Request parameters that stay fixed for the session's lifetime.
#[derive(Debug, Clone)]
struct TurnSettings {
    model: String,
    temperature: f32,
    max_tokens: u32,
    history_window: usize,
    stop_phrases: Vec<String>,
    test_prompt: String,
    include_follow_up: bool,
    max_chars: usize,
    max_documents: Option<usize>,
}

impl TurnSettings {
    fn from_config(config: &FridayConfig) -> Self {
        Self {
            model: config.completion.model.clone(),
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
            history_window: config.completion.history_window,
            stop_phrases: config
                .assistant
                .stop_phrases
                .iter()
                .map(|phrase| phrase.to_lowercase())
                .collect(),
            test_prompt: config.assistant.test_prompt.clone(),
            include_follow_up: config.reply.include_follow_up,
            max_chars: config.documents.max_chars,
            max_documents: config.documents.max_documents,
        }
    }
}

/// Context used when no user is signed in.
struct NoUserContext;

impl UserContext for NoUserContext {
    fn profile(&self) -> Option<UserProfile> {
        None
    }

    fn study_sources(&self) -> Vec<StudySource> {
        Vec::new()
    }
}

/// One user's conversation with the assistant.
///
/// History is guarded by a short-held lock. Concurrent `process_input` calls
/// are allowed and may interleave their turns.
pub struct ConversationSession {
    id: Uuid,
    user_key: String,
    settings: TurnSettings,
    api_key: RwLock<Option<String>>,
    history: Mutex<Vec<ConversationTurn>>,
    prompt: PromptBuilder,
    parser: ReplyParser,
    dispatcher: OutputDispatcher,
    memory: Arc<LongTermMemory>,
    context: Arc<dyn UserContext>,
    client: Arc<dyn CompletionClient>,
}

impl ConversationSession {
    /// Start building a session from config for the given user key.
    pub fn builder(config: FridayConfig, user_key: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(config, user_key)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn state(&self) -> SessionState {
        if self.history.lock().is_empty() {
            SessionState::Idle
        } else {
            SessionState::Active
        }
    }

    /// Snapshot of the full history.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history.lock().clone()
    }

    /// Drop all history; the next turn starts with a fresh system prompt.
    pub fn reset(&self) {
        let dropped = {
            let mut history = self.history.lock();
            let dropped = history.len();
            history.clear();
            dropped
        };
        info!(
            "session reset (session_id={}, dropped_turns={})",
            self.id, dropped
        );
    }

    pub fn set_api_key(&self, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        *self.api_key.write() = if key.is_empty() { None } else { Some(key) };
    }

    pub fn clear_api_key(&self) {
        *self.api_key.write() = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.read().is_some()
    }

    pub fn memory(&self) -> &Arc<LongTermMemory> {
        &self.memory
    }

    /// Long-term memory digest for this session's user.
    pub async fn memory_summary(&self) -> String {
        self.memory.summarize(&self.user_key).await
    }

    /// Count an explicit topic mention for this user.
    pub async fn record_topic(&self, topic: &str) {
        self.memory
            .record_event(&self.user_key, MemoryEvent::Topic(topic.to_string()))
            .await;
    }

    /// Send the configured test prompt through the normal turn pipeline.
    pub async fn test_connection(&self) -> Result<Option<TurnOutcome>, FridayCoreError> {
        if !self.has_api_key() {
            return Err(FridayCoreError::MissingCredential);
        }
        let prompt = self.settings.test_prompt.clone();
        Ok(self.process_input(&prompt).await)
    }

    /// Handle one utterance. Returns `None` for blank input.
    ///
    /// The utterance reaches the transcript and history as given; trimming only
    /// decides blankness and stop phrases.
    ///
    /// Every non-blank utterance yields a delivered reply; failures are
    /// replaced by fixed fallback replies.
    pub async fn process_input(&self, text: &str) -> Option<TurnOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring blank input (session_id={})", self.id);
            return None;
        }

        if self.is_stop_phrase(trimmed) {
            info!("stop phrase received (session_id={})", self.id);
            return Some(self.deliver_fixed(ReplyKind::Farewell).await);
        }

        self.dispatcher.user_turn(text);
        self.memory
            .record_event(&self.user_key, MemoryEvent::UserMessage(text.to_string()))
            .await;

        let api_key = self.api_key.read().clone();
        let Some(api_key) = api_key else {
            warn!("no api key configured (session_id={})", self.id);
            return Some(self.deliver_fixed(ReplyKind::MissingCredential).await);
        };

        let request = self.prepare_request(text).await;
        match self.client.complete(&api_key, &request).await {
            Ok(content) => {
                self.history
                    .lock()
                    .push(ConversationTurn::assistant(content.clone()));
                let reply = self.parser.parse(&content);
                Some(self.deliver(reply, content, ReplyKind::Model).await)
            }
            Err(err) => {
                let kind = match &err {
                    CompletionError::Rejected { .. } => ReplyKind::ServerRejected,
                    CompletionError::Malformed(_) => ReplyKind::MalformedResponse,
                    CompletionError::Client(_)
                    | CompletionError::Transport(_)
                    | CompletionError::Timeout(_) => ReplyKind::TransportFailure,
                };
                warn!(
                    "completion failed (session_id={}, kind={:?}, error={})",
                    self.id, kind, err
                );
                Some(self.deliver_fixed(kind).await)
            }
        }
    }

    fn is_stop_phrase(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.settings
            .stop_phrases
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
    }

    /// Insert the system turn if idle, append the user turn, and window history.
    async fn prepare_request(&self, text: &str) -> CompletionRequest {
        let system_prompt = if self.state() == SessionState::Idle {
            let summary = self.memory.summarize(&self.user_key).await;
            let profile = self.context.profile();
            Some(self.prompt.build_system_prompt(profile.as_ref(), &summary))
        } else {
            None
        };

        let messages = {
            let mut history = self.history.lock();
            if history.is_empty()
                && let Some(prompt) = system_prompt
            {
                debug!(
                    "inserted system prompt (session_id={}, len={})",
                    self.id,
                    prompt.len()
                );
                history.push(ConversationTurn::system(prompt));
            }
            history.push(ConversationTurn::user(text));
            let start = history.len().saturating_sub(self.settings.history_window);
            history[start..].to_vec()
        };

        let documents = build_documents(
            &self.context.study_sources(),
            self.settings.max_chars,
            self.settings.max_documents,
        );
        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            documents,
        }
    }

    async fn deliver_fixed(&self, kind: ReplyKind) -> TurnOutcome {
        let reply = kind
            .fixed_reply(self.settings.include_follow_up)
            .unwrap_or_default();
        let raw = reply.render(self.parser.labels());
        self.deliver(reply, raw, kind).await
    }

    /// Transcript, then memory, then speech.
    async fn deliver(&self, reply: ParsedReply, raw: String, kind: ReplyKind) -> TurnOutcome {
        self.dispatcher.assistant_turn(&reply);
        self.memory
            .record_event(&self.user_key, MemoryEvent::AiReply(raw.clone()))
            .await;
        self.dispatcher.speak(&reply, &raw).await;
        if kind.is_fallback() {
            info!(
                "fallback reply delivered (session_id={}, kind={:?})",
                self.id, kind
            );
        } else {
            debug!(
                "reply delivered (session_id={}, kind={:?}, len={})",
                self.id,
                kind,
                raw.len()
            );
        }
        TurnOutcome { reply, raw, kind }
    }
}

/// Assembles a `ConversationSession` from config and collaborators.
///
/// Speech and transcript sinks are required. Unset collaborators default to
/// the HTTP client from `completion`, a memory store per `memory.path`, no
/// signed-in user, and the API key resolved from config.
pub struct SessionBuilder {
    config: FridayConfig,
    user_key: String,
    speech: Option<Arc<dyn SpeechSink>>,
    transcript: Option<Arc<dyn TranscriptSink>>,
    client: Option<Arc<dyn CompletionClient>>,
    memory: Option<Arc<LongTermMemory>>,
    context: Option<Arc<dyn UserContext>>,
    api_key: Option<Option<String>>,
}

impl SessionBuilder {
    pub fn new(config: FridayConfig, user_key: impl Into<String>) -> Self {
        Self {
            config,
            user_key: user_key.into(),
            speech: None,
            transcript: None,
            client: None,
            memory: None,
            context: None,
            api_key: None,
        }
    }

    pub fn speech(mut self, speech: Arc<dyn SpeechSink>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn transcript(mut self, transcript: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Share a memory store, e.g. across sessions for different users.
    pub fn memory(mut self, memory: Arc<LongTermMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn context(mut self, context: Arc<dyn UserContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Override the configured API key; `None` starts without a credential.
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn build(self) -> Result<ConversationSession, FridayCoreError> {
        let config = self.config;
        let speech = self
            .speech
            .ok_or(FridayCoreError::MissingCollaborator("a speech sink"))?;
        let transcript = self
            .transcript
            .ok_or(FridayCoreError::MissingCollaborator("a transcript sink"))?;
        let client: Arc<dyn CompletionClient> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpCompletionClient::from_config(&config.completion)?),
        };
        let memory = match self.memory {
            Some(memory) => memory,
            None => Arc::new(memory_from_config(&config)?),
        };
        let context = self.context.unwrap_or_else(|| Arc::new(NoUserContext));
        let api_key = self
            .api_key
            .unwrap_or_else(|| config.completion.resolve_api_key())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let session = ConversationSession {
            id: Uuid::new_v4(),
            user_key: self.user_key,
            settings: TurnSettings::from_config(&config),
            api_key: RwLock::new(api_key),
            history: Mutex::new(Vec::new()),
            prompt: PromptBuilder::new(&config.assistant, &config.reply),
            parser: ReplyParser::new(config.reply.labels.clone()),
            dispatcher: OutputDispatcher::new(
                transcript,
                speech,
                config.reply.labels.clone(),
                config.speech.clone(),
            ),
            memory,
            context,
            client,
        };
        info!(
            "created session (session_id={}, user_key={}, model={}, has_api_key={})",
            session.id,
            session.user_key,
            session.settings.model,
            session.has_api_key()
        );
        Ok(session)
    }
}

/// Long-term memory backed by the store named in `memory.path`, or in-process.
///
/// Limits are clamped to their caps even when `config` was never validated.
pub fn memory_from_config(config: &FridayConfig) -> Result<LongTermMemory, FridayCoreError> {
    let memory = &config.memory;
    let store: Arc<dyn KeyValueStore> = match memory.path.as_deref() {
        Some(path) => Arc::new(FileKeyValueStore::new(path)?),
        None => Arc::new(InMemoryKeyValueStore::new()),
    };
    let policy = MemoryPolicy {
        max_recent_messages: memory.max_recent_messages.clamp(1, MAX_RECENT_MESSAGES),
        summary_top_topics: memory.summary_top_topics.min(MAX_SUMMARY_TOP_TOPICS),
        summary_recent_messages: memory.summary_recent_messages,
        ..MemoryPolicy::default()
    };
    Ok(LongTermMemory::with_storage_key(
        store,
        memory.storage_key.clone(),
        policy,
    ))
}
