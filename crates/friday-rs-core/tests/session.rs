//! Conversation session integration tests with stub collaborators.

use async_trait::async_trait;
use friday_rs_config::FridayConfig;
use friday_rs_core::{
    CompletionError, ConversationSession, FridayCoreError, ReplyKind, SessionState,
    memory_from_config,
};
use friday_rs_memory::{
    InMemoryKeyValueStore, KeyValueStore, LongTermMemory, MemoryError, MemoryEvent, MemoryPolicy,
};
use friday_rs_protocol::{
    ParsedReply, Role, SpeechError, SpeechRequest, SpeechSink, TranscriptEntry, TranscriptSink,
};
use friday_rs_test_utils::{
    FailingCompletion, FailingSpeech, FailingStore, RecordingCompletion, RecordingSpeech,
    RecordingTranscript, StaticUserContext,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const MODEL_REPLY: &str = "EN: Hi there.\nES: Hola.\nASK: How are you?\nFIX: OK";

struct Harness {
    session: ConversationSession,
    client: Arc<RecordingCompletion>,
    speech: Arc<RecordingSpeech>,
    transcript: Arc<RecordingTranscript>,
    memory: Arc<LongTermMemory>,
}

fn harness_with(config: FridayConfig, api_key: Option<&str>) -> Harness {
    let client = Arc::new(RecordingCompletion::new(MODEL_REPLY));
    let speech = Arc::new(RecordingSpeech::new());
    let transcript = Arc::new(RecordingTranscript::new());
    let memory = Arc::new(LongTermMemory::new(
        Arc::new(InMemoryKeyValueStore::new()),
        MemoryPolicy::default(),
    ));
    let context = Arc::new(StaticUserContext::named("Ana"));
    context.add_source("Grammar", "Past simple notes");
    let session = ConversationSession::builder(config, "ana")
        .client(client.clone())
        .speech(speech.clone())
        .transcript(transcript.clone())
        .memory(memory.clone())
        .context(context)
        .api_key(api_key.map(str::to_string))
        .build()
        .expect("session");
    Harness {
        session,
        client,
        speech,
        transcript,
        memory,
    }
}

fn harness(api_key: Option<&str>) -> Harness {
    harness_with(FridayConfig::default(), api_key)
}

#[tokio::test]
async fn successful_turn_parses_dispatches_and_records() {
    let h = harness(Some("key"));
    let outcome = h.session.process_input("Hello").await.expect("outcome");

    assert_eq!(outcome.kind, ReplyKind::Model);
    assert_eq!(
        outcome.reply,
        ParsedReply::new("Hi there.", "Hola.", "How are you?", "OK")
    );
    assert_eq!(h.session.state(), SessionState::Active);

    let history = h.session.history();
    let roles: Vec<Role> = history.iter().map(|turn| turn.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    assert!(history[0].content.contains("tutor for \"Ana\""));
    assert_eq!(history[2].content, MODEL_REPLY);

    let requests = h.client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "llama-3.1-8b-instant");
    assert_eq!(requests[0].max_tokens, 260);
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[0].documents.len(), 1);
    assert_eq!(requests[0].documents[0].metadata.title, "Grammar");
    assert_eq!(h.client.api_keys(), vec!["key".to_string()]);

    assert_eq!(h.transcript.texts(), vec!["Hello".to_string(), MODEL_REPLY.to_string()]);
    assert_eq!(h.speech.spoken(), vec!["Hi there.".to_string()]);

    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(
        record.recent_messages,
        vec!["Hello".to_string(), format!("FRIDAY: {MODEL_REPLY}")]
    );
}

#[tokio::test]
async fn stop_phrase_replies_without_network() {
    let h = harness(Some("key"));
    let outcome = h
        .session
        .process_input("OK Friday STOP for today please")
        .await
        .expect("outcome");

    assert_eq!(outcome.kind, ReplyKind::Farewell);
    assert_eq!(outcome.reply.answer, "Alright, I'll stop for today.");
    assert_eq!(h.client.call_count(), 0);
    assert_eq!(h.session.state(), SessionState::Idle);

    let entries = h.transcript.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, Role::Assistant);

    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(record.recent_messages.len(), 1);
    assert!(record.recent_messages[0].starts_with("FRIDAY: EN: Alright"));
}

#[tokio::test]
async fn missing_credential_replies_without_network() {
    let h = harness(None);
    let outcome = h.session.process_input("Hello").await.expect("outcome");

    assert_eq!(outcome.kind, ReplyKind::MissingCredential);
    assert_eq!(outcome.reply.answer, "I need your API key first.");
    assert_eq!(h.client.call_count(), 0);
    assert_eq!(h.transcript.entries().len(), 2);
    assert_eq!(h.speech.spoken(), vec!["I need your API key first.".to_string()]);
    assert!(h.session.history().is_empty());

    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(record.recent_messages[0], "Hello");
}

#[tokio::test]
async fn server_rejection_uses_fallback_and_skips_assistant_turn() {
    let h = harness(Some("key"));
    h.client.push_error(CompletionError::Rejected {
        status: 500,
        body: "internal".to_string(),
    });
    let outcome = h.session.process_input("Hello").await.expect("outcome");

    assert_eq!(outcome.kind, ReplyKind::ServerRejected);
    assert_eq!(outcome.reply.answer, "I had a problem talking to the server.");
    let roles: Vec<Role> = h.session.history().iter().map(|turn| turn.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User]);
    assert_eq!(
        h.transcript.texts().last().cloned().expect("reply"),
        outcome.raw
    );
}

#[tokio::test]
async fn transport_and_malformed_failures_map_to_their_fallbacks() {
    let h = harness(Some("key"));
    h.client
        .push_error(CompletionError::Timeout(Duration::from_secs(30)));
    h.client
        .push_error(CompletionError::Malformed("no choices".to_string()));

    let timeout = h.session.process_input("one").await.expect("outcome");
    let malformed = h.session.process_input("two").await.expect("outcome");

    assert_eq!(timeout.kind, ReplyKind::TransportFailure);
    assert_eq!(timeout.reply.answer, "I could not reach the server.");
    assert_eq!(malformed.kind, ReplyKind::MalformedResponse);
    assert_eq!(malformed.reply.answer, "I could not understand the response.");
    assert!(
        h.session
            .history()
            .iter()
            .all(|turn| turn.role != Role::Assistant)
    );
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let h = harness(Some("key"));
    assert_eq!(h.session.process_input("   ").await, None);
    assert_eq!(h.client.call_count(), 0);
    assert!(h.transcript.entries().is_empty());
    assert_eq!(h.memory.record("ana").await, None);
}

#[tokio::test]
async fn history_window_limits_sent_turns_without_mutating_history() {
    let mut config = FridayConfig::default();
    config.completion.history_window = 4;
    let h = harness_with(config, Some("key"));

    for idx in 0..3 {
        h.session.process_input(&format!("message {idx}")).await;
    }

    assert_eq!(h.session.history().len(), 7);
    let last = h.client.requests().pop().expect("request");
    assert_eq!(last.messages.len(), 4);
    assert_eq!(last.messages[3].content, "message 2");
    assert_eq!(h.session.history()[0].role, Role::System);
}

#[tokio::test]
async fn system_prompt_is_inserted_once_and_reset_starts_over() {
    let h = harness(Some("key"));
    h.session.process_input("first").await;
    h.session.process_input("second").await;
    let systems = h
        .session
        .history()
        .iter()
        .filter(|turn| turn.role == Role::System)
        .count();
    assert_eq!(systems, 1);

    h.session.reset();
    assert_eq!(h.session.state(), SessionState::Idle);
    h.session.process_input("third").await;
    let history = h.session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::System);
    assert!(history[0].content.contains("second"));
}

#[tokio::test]
async fn thirteen_user_messages_keep_last_twelve() {
    let h = harness(None);
    for idx in 0..13 {
        h.memory
            .record_event("ana", MemoryEvent::UserMessage(format!("m{idx}")))
            .await;
    }
    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(record.recent_messages.len(), 12);
    assert_eq!(record.recent_messages.front().map(String::as_str), Some("m1"));
    assert_eq!(record.recent_messages.back().map(String::as_str), Some("m12"));
}

#[tokio::test]
async fn api_key_can_be_set_and_cleared() {
    let h = harness(None);
    assert!(!h.session.has_api_key());
    h.session.set_api_key("  ");
    assert!(!h.session.has_api_key());

    h.session.set_api_key("new-key");
    let outcome = h.session.process_input("Hello").await.expect("outcome");
    assert_eq!(outcome.kind, ReplyKind::Model);
    assert_eq!(h.client.api_keys(), vec!["new-key".to_string()]);

    h.session.clear_api_key();
    let outcome = h.session.process_input("Hello again").await.expect("outcome");
    assert_eq!(outcome.kind, ReplyKind::MissingCredential);
}

#[tokio::test]
async fn test_connection_requires_a_key_and_sends_test_prompt() {
    let h = harness(None);
    let err = h.session.test_connection().await.expect_err("no key");
    assert!(matches!(err, FridayCoreError::MissingCredential));
    assert!(h.transcript.entries().is_empty());

    h.session.set_api_key("key");
    let outcome = h
        .session
        .test_connection()
        .await
        .expect("test")
        .expect("outcome");
    assert_eq!(outcome.kind, ReplyKind::Model);
    let sent = h.client.requests().pop().expect("request");
    assert_eq!(
        sent.messages.last().map(|turn| turn.content.as_str()),
        Some("Hello Friday, this is a short test. Answer in your normal style.")
    );
}

#[tokio::test]
async fn recorded_topics_reach_the_next_system_prompt() {
    let h = harness(Some("key"));
    h.session.record_topic("printers").await;
    h.session.process_input("my printer is jammed").await;

    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(record.topic_count("printers"), 2);

    h.session.reset();
    h.session.process_input("hi").await;
    let system = &h.session.history()[0].content;
    assert!(system.contains("Top topics: printers (2)"), "{system}");
}

#[tokio::test]
async fn disabled_follow_up_drops_ask_from_fallbacks() {
    let mut config = FridayConfig::default();
    config.reply.include_follow_up = false;
    let h = harness_with(config, None);
    let outcome = h.session.process_input("Hello").await.expect("outcome");
    assert_eq!(outcome.reply.follow_up, "");
    assert!(!outcome.raw.contains("ASK:"));
}

#[tokio::test]
async fn storage_and_speech_failures_never_break_a_turn() {
    let client = Arc::new(RecordingCompletion::new(MODEL_REPLY));
    let transcript = Arc::new(RecordingTranscript::new());
    let store = Arc::new(FailingStore::new());
    let memory = Arc::new(LongTermMemory::new(store.clone(), MemoryPolicy::default()));
    let session = ConversationSession::builder(FridayConfig::default(), "ana")
        .client(client)
        .speech(Arc::new(FailingSpeech))
        .transcript(transcript.clone())
        .memory(memory.clone())
        .api_key(Some("key".to_string()))
        .build()
        .expect("session");

    let outcome = session.process_input("Hello").await.expect("outcome");
    assert_eq!(outcome.kind, ReplyKind::Model);
    assert_eq!(transcript.entries().len(), 2);
    assert_eq!(store.write_attempts(), 2);
    let record = memory.record("ana").await.expect("cached record");
    assert_eq!(record.recent_messages.len(), 2);
}

#[tokio::test]
async fn builder_requires_sinks() {
    let err = ConversationSession::builder(FridayConfig::default(), "ana")
        .build()
        .err()
        .expect("missing sinks");
    assert!(matches!(err, FridayCoreError::MissingCollaborator(_)));
}

#[tokio::test]
async fn file_backed_memory_survives_a_new_session() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut config = FridayConfig::default();
    config.memory.path = Some(temp.path().display().to_string());

    let build = |config: FridayConfig| {
        ConversationSession::builder(config, "ana")
            .client(Arc::new(RecordingCompletion::new(MODEL_REPLY)))
            .speech(Arc::new(RecordingSpeech::new()))
            .transcript(Arc::new(RecordingTranscript::new()))
            .api_key(Some("key".to_string()))
            .build()
            .expect("session")
    };

    let first = build(config.clone());
    first.record_topic("printers").await;
    first.process_input("Hello").await;
    drop(first);

    let second = build(config);
    let summary = second.memory_summary().await;
    assert!(summary.contains("Top topics: printers (1)"), "{summary}");
    assert!(summary.contains("Hello"), "{summary}");
}

#[tokio::test]
async fn oversized_memory_window_is_clamped_to_twelve() {
    let mut config = FridayConfig::default();
    config.memory.max_recent_messages = 20;
    config.memory.summary_top_topics = 9;
    let memory = memory_from_config(&config).expect("memory");
    assert_eq!(memory.policy().max_recent_messages, 12);
    assert_eq!(memory.policy().summary_top_topics, 4);

    for idx in 0..13 {
        memory
            .record_event("ana", MemoryEvent::UserMessage(format!("m{idx}")))
            .await;
    }
    let record = memory.record("ana").await.expect("record");
    assert_eq!(record.recent_messages.len(), 12);
    assert_eq!(record.recent_messages.front().map(String::as_str), Some("m1"));
}

/// Shared log of collaborator calls in the order they happened.
type CallLog = Arc<Mutex<Vec<String>>>;

struct LoggingTranscript {
    log: CallLog,
}

impl TranscriptSink for LoggingTranscript {
    fn append(&self, entry: TranscriptEntry) {
        self.log.lock().push(format!("transcript:{}", entry.role.as_str()));
    }
}

struct LoggingStore {
    inner: InMemoryKeyValueStore,
    log: CallLog,
}

#[async_trait]
impl KeyValueStore for LoggingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        self.log.lock().push("memory".to_string());
        self.inner.set(key, value).await
    }
}

/// Speech sink that snapshots the user's recent messages when it is called.
struct MemoryCheckingSpeech {
    memory: Arc<LongTermMemory>,
    log: CallLog,
    seen: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SpeechSink for MemoryCheckingSpeech {
    async fn speak(&self, _request: SpeechRequest) -> Result<(), SpeechError> {
        self.log.lock().push("speech".to_string());
        let recent: Vec<String> = self
            .memory
            .record("ana")
            .await
            .map(|record| record.recent_messages.into_iter().collect())
            .unwrap_or_default();
        self.seen.lock().push(recent);
        Ok(())
    }
}

#[tokio::test]
async fn reply_reaches_transcript_then_memory_then_speech() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let memory = Arc::new(LongTermMemory::new(
        Arc::new(LoggingStore {
            inner: InMemoryKeyValueStore::new(),
            log: log.clone(),
        }),
        MemoryPolicy::default(),
    ));
    let speech = Arc::new(MemoryCheckingSpeech {
        memory: memory.clone(),
        log: log.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let session = ConversationSession::builder(FridayConfig::default(), "ana")
        .client(Arc::new(RecordingCompletion::new(MODEL_REPLY)))
        .speech(speech.clone())
        .transcript(Arc::new(LoggingTranscript { log: log.clone() }))
        .memory(memory)
        .api_key(Some("key".to_string()))
        .build()
        .expect("session");

    session.process_input("Hello").await.expect("outcome");

    assert_eq!(
        *log.lock(),
        vec![
            "transcript:user".to_string(),
            "memory".to_string(),
            "transcript:assistant".to_string(),
            "memory".to_string(),
            "speech".to_string(),
        ]
    );
    assert_eq!(
        *speech.seen.lock(),
        vec![vec!["Hello".to_string(), format!("FRIDAY: {MODEL_REPLY}")]]
    );
}

#[tokio::test]
async fn rejecting_endpoint_falls_back_on_every_turn() {
    let transcript = Arc::new(RecordingTranscript::new());
    let session = ConversationSession::builder(FridayConfig::default(), "ana")
        .client(Arc::new(FailingCompletion::new(503)))
        .speech(Arc::new(RecordingSpeech::new()))
        .transcript(transcript.clone())
        .api_key(Some("key".to_string()))
        .build()
        .expect("session");

    for text in ["one", "two"] {
        let outcome = session.process_input(text).await.expect("outcome");
        assert_eq!(outcome.kind, ReplyKind::ServerRejected);
        assert!(outcome.kind.is_fallback());
    }
    let roles: Vec<Role> = session.history().iter().map(|turn| turn.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::User]);
    assert_eq!(transcript.entries().len(), 4);
}

#[tokio::test]
async fn utterance_is_dispatched_untrimmed() {
    let h = harness(Some("key"));
    h.session.process_input("  Hello there \n").await.expect("outcome");

    assert_eq!(h.transcript.texts()[0], "  Hello there \n");
    assert_eq!(h.session.history()[1].content, "  Hello there \n");
    let record = h.memory.record("ana").await.expect("record");
    assert_eq!(record.recent_messages[0], "Hello there");
}
