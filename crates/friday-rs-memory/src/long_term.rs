//! Long-term memory store with write-through persistence.
//!
//! All users share one blob under a single storage key. Every event reloads
//! the blob, applies the mutation, and writes the whole blob back. Storage
//! failures never reach the caller: a failed read keeps the cached state, a
//! corrupt blob resets the store to empty, and a failed write is logged.

use crate::model::{MemoryEvent, MemoryRecord};
use crate::policy::MemoryPolicy;
use crate::store::KeyValueStore;
use crate::topics::detect_topics;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Summary returned for users without any recorded events.
pub const NO_MEMORY_SENTINEL: &str = "No long-term memory for this user yet.";

/// Default storage key for the memory blob.
pub const DEFAULT_STORAGE_KEY: &str = "friday_ultra_memory";

type MemoryDb = BTreeMap<String, MemoryRecord>;

/// Per-user long-term memory backed by a key-value store.
pub struct LongTermMemory {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    policy: MemoryPolicy,
    cache: RwLock<MemoryDb>,
}

impl LongTermMemory {
    /// Create a memory store with the default storage key.
    pub fn new(store: Arc<dyn KeyValueStore>, policy: MemoryPolicy) -> Self {
        Self::with_storage_key(store, DEFAULT_STORAGE_KEY, policy)
    }

    /// Create a memory store persisting under a custom storage key.
    pub fn with_storage_key(
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        policy: MemoryPolicy,
    ) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            policy,
            cache: RwLock::new(MemoryDb::new()),
        }
    }

    /// Active retention policy.
    pub fn policy(&self) -> &MemoryPolicy {
        &self.policy
    }

    /// Record an event for a user and persist the whole store.
    pub async fn record_event(&self, user_key: &str, event: MemoryEvent) {
        self.record_event_at(user_key, event, Utc::now()).await;
    }

    /// Record an event using an explicit timestamp.
    pub async fn record_event_at(&self, user_key: &str, event: MemoryEvent, now: DateTime<Utc>) {
        self.refresh().await;
        let snapshot = {
            let mut db = self.cache.write();
            let record = db
                .entry(user_key.to_string())
                .or_insert_with(|| MemoryRecord::new(now));
            record.last_seen = now;
            apply_event(record, &event, &self.policy);
            debug!(
                "recorded memory event (user_key={}, kind={}, recent={})",
                user_key,
                event.kind(),
                record.recent_messages.len()
            );
            serde_json::to_string(&*db)
        };
        match snapshot {
            Ok(blob) => self.persist(&blob).await,
            Err(err) => warn!("failed to encode memory store (error={})", err),
        }
    }

    /// Snapshot of a user's record, if one exists.
    pub async fn record(&self, user_key: &str) -> Option<MemoryRecord> {
        self.refresh().await;
        self.cache.read().get(user_key).cloned()
    }

    /// Digest of a user's memory for prompt injection.
    pub async fn summarize(&self, user_key: &str) -> String {
        match self.record(user_key).await {
            Some(record) => format_summary(&record, &self.policy),
            None => NO_MEMORY_SENTINEL.to_string(),
        }
    }

    /// Reload the cache from storage.
    async fn refresh(&self) {
        match self.store.get(&self.storage_key).await {
            Ok(Some(blob)) => match serde_json::from_str::<MemoryDb>(&blob) {
                Ok(db) => *self.cache.write() = db,
                Err(err) => {
                    warn!(
                        "corrupt memory blob, resetting store (key={}, error={})",
                        self.storage_key, err
                    );
                    *self.cache.write() = MemoryDb::new();
                }
            },
            Ok(None) => {}
            Err(err) => warn!(
                "memory read failed, keeping cached state (key={}, error={})",
                self.storage_key, err
            ),
        }
    }

    async fn persist(&self, blob: &str) {
        if let Err(err) = self.store.set(&self.storage_key, blob).await {
            warn!(
                "memory write failed (key={}, error={})",
                self.storage_key, err
            );
        }
    }
}

/// Apply a single event to a record.
fn apply_event(record: &mut MemoryRecord, event: &MemoryEvent, policy: &MemoryPolicy) {
    match event {
        MemoryEvent::UserMessage(text) => {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            record.push_recent(text.to_string(), policy.max_recent_messages);
            for topic in detect_topics(text) {
                record.bump_topic(topic);
            }
        }
        MemoryEvent::AiReply(text) => {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            record.push_recent(
                format!("{}{text}", policy.reply_prefix),
                policy.max_recent_messages,
            );
        }
        MemoryEvent::Topic(topic) => {
            let topic = topic.trim();
            if !topic.is_empty() {
                record.bump_topic(topic);
            }
        }
    }
}

/// Render the summary block injected into system prompts.
fn format_summary(record: &MemoryRecord, policy: &MemoryPolicy) -> String {
    let top_topics = record
        .top_topics(policy.summary_top_topics)
        .into_iter()
        .map(|entry| format!("{} ({})", entry.topic, entry.count))
        .collect::<Vec<_>>();
    let top_topics = if top_topics.is_empty() {
        "none yet".to_string()
    } else {
        top_topics.join(", ")
    };
    let recent = record
        .last_messages(policy.summary_recent_messages)
        .join(" || ");
    format!(
        "Long-term memory:\n\
- First seen: {}\n\
- Last seen: {}\n\
- Top topics: {top_topics}\n\
- Last interactions: {recent}",
        record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        record.last_seen.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}
