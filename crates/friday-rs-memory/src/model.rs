//! Memory record model persisted per user key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Event recorded into long-term memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum MemoryEvent {
    /// Text the user said or typed.
    UserMessage(String),
    /// Reply produced for the user.
    AiReply(String),
    /// Explicit topic mention.
    Topic(String),
}

impl MemoryEvent {
    /// Event kind as a lowercase label.
    pub fn kind(&self) -> &'static str {
        match self {
            MemoryEvent::UserMessage(_) => "user_message",
            MemoryEvent::AiReply(_) => "ai_reply",
            MemoryEvent::Topic(_) => "topic",
        }
    }
}

/// Occurrence counter for a single topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

/// Persisted long-term memory for one user.
///
/// Topic counters grow without eviction; they are kept in first-seen order so
/// equal counts rank by insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent event.
    pub last_seen: DateTime<Utc>,
    /// Most recent messages, oldest first.
    #[serde(default)]
    pub recent_messages: VecDeque<String>,
    /// Topic counters in first-seen order.
    #[serde(default)]
    pub topics: Vec<TopicCount>,
}

impl MemoryRecord {
    /// Create an empty record stamped with `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_seen: now,
            recent_messages: VecDeque::new(),
            topics: Vec::new(),
        }
    }

    /// Append a message, evicting the oldest entries beyond `limit`.
    pub fn push_recent(&mut self, message: String, limit: usize) {
        self.recent_messages.push_back(message);
        while self.recent_messages.len() > limit {
            self.recent_messages.pop_front();
        }
    }

    /// Increment a topic counter, inserting it at the end when new.
    pub fn bump_topic(&mut self, topic: &str) {
        match self.topics.iter_mut().find(|entry| entry.topic == topic) {
            Some(entry) => entry.count += 1,
            None => self.topics.push(TopicCount {
                topic: topic.to_string(),
                count: 1,
            }),
        }
    }

    /// Count for a topic, zero when unseen.
    pub fn topic_count(&self, topic: &str) -> u64 {
        self.topics
            .iter()
            .find(|entry| entry.topic == topic)
            .map_or(0, |entry| entry.count)
    }

    /// Highest counts first; ties keep insertion order.
    pub fn top_topics(&self, limit: usize) -> Vec<&TopicCount> {
        let mut ranked: Vec<&TopicCount> = self.topics.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(limit);
        ranked
    }

    /// Last `limit` recent messages in original order.
    pub fn last_messages(&self, limit: usize) -> Vec<&str> {
        let start = self.recent_messages.len().saturating_sub(limit);
        self.recent_messages
            .iter()
            .skip(start)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryEvent, MemoryRecord};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn push_recent_evicts_oldest() {
        let mut record = MemoryRecord::new(Utc::now());
        for idx in 0..5 {
            record.push_recent(format!("m{idx}"), 3);
        }
        assert_eq!(record.recent_messages, vec!["m2", "m3", "m4"]);
        assert_eq!(record.last_messages(2), vec!["m3", "m4"]);
        assert_eq!(record.last_messages(10).len(), 3);
    }

    #[test]
    fn top_topics_breaks_ties_by_insertion() {
        let mut record = MemoryRecord::new(Utc::now());
        record.bump_topic("speakers");
        record.bump_topic("printers");
        record.bump_topic("monitors");
        record.bump_topic("monitors");
        let ranked: Vec<&str> = record
            .top_topics(4)
            .into_iter()
            .map(|entry| entry.topic.as_str())
            .collect();
        assert_eq!(ranked, vec!["monitors", "speakers", "printers"]);
        assert_eq!(record.topic_count("monitors"), 2);
        assert_eq!(record.topic_count("business"), 0);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = MemoryEvent::Topic("printers".to_string());
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value, json!({ "kind": "topic", "payload": "printers" }));
        assert_eq!(MemoryEvent::AiReply(String::new()).kind(), "ai_reply");
    }
}
