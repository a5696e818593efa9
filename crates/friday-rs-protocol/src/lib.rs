//! Wire protocol types for Friday conversations, replies, and collaborators.

mod context;
mod sink;

pub use context::{StudySource, UserContext, UserProfile};
pub use sink::{SpeechError, SpeechRequest, SpeechSink, TranscriptEntry, TranscriptSink};

use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and format instructions.
    System,
    /// User utterance.
    User,
    /// Model reply.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Single message in the session history, serialized as `{role, content}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Role that produced the turn.
    pub role: Role,
    /// Turn content.
    pub content: String,
}

impl ConversationTurn {
    /// Build a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Semantic field of a structured reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyField {
    /// Answer in the target language (spoken aloud).
    Answer,
    /// Translation of the answer.
    Translation,
    /// Follow-up question that keeps the conversation going.
    FollowUp,
    /// Correction of the user's phrasing.
    Correction,
}

impl ReplyField {
    /// Fields in the order the model must emit them.
    pub const ALL: [ReplyField; 4] = [
        ReplyField::Answer,
        ReplyField::Translation,
        ReplyField::FollowUp,
        ReplyField::Correction,
    ];
}

/// Line prefixes used for each reply field.
///
/// Labels are ASCII and matched without regard to ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyLabels {
    #[serde(default = "default_answer_label")]
    pub answer: String,
    #[serde(default = "default_translation_label")]
    pub translation: String,
    #[serde(default = "default_follow_up_label")]
    pub follow_up: String,
    #[serde(default = "default_correction_label")]
    pub correction: String,
}

impl ReplyLabels {
    /// Label text for a field, without the trailing colon.
    pub fn label(&self, field: ReplyField) -> &str {
        match field {
            ReplyField::Answer => &self.answer,
            ReplyField::Translation => &self.translation,
            ReplyField::FollowUp => &self.follow_up,
            ReplyField::Correction => &self.correction,
        }
    }
}

impl Default for ReplyLabels {
    fn default() -> Self {
        Self {
            answer: default_answer_label(),
            translation: default_translation_label(),
            follow_up: default_follow_up_label(),
            correction: default_correction_label(),
        }
    }
}

fn default_answer_label() -> String {
    "EN".to_string()
}

fn default_translation_label() -> String {
    "ES".to_string()
}

fn default_follow_up_label() -> String {
    "ASK".to_string()
}

fn default_correction_label() -> String {
    "FIX".to_string()
}

/// Model reply decomposed into labeled fields. Empty strings mean absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedReply {
    pub answer: String,
    pub translation: String,
    pub follow_up: String,
    pub correction: String,
}

impl ParsedReply {
    /// Build a reply from its four fields.
    pub fn new(
        answer: impl Into<String>,
        translation: impl Into<String>,
        follow_up: impl Into<String>,
        correction: impl Into<String>,
    ) -> Self {
        Self {
            answer: answer.into(),
            translation: translation.into(),
            follow_up: follow_up.into(),
            correction: correction.into(),
        }
    }

    /// Value of a single field.
    pub fn field(&self, field: ReplyField) -> &str {
        match field {
            ReplyField::Answer => &self.answer,
            ReplyField::Translation => &self.translation,
            ReplyField::FollowUp => &self.follow_up,
            ReplyField::Correction => &self.correction,
        }
    }

    /// Mutable access to a single field.
    pub fn field_mut(&mut self, field: ReplyField) -> &mut String {
        match field {
            ReplyField::Answer => &mut self.answer,
            ReplyField::Translation => &mut self.translation,
            ReplyField::FollowUp => &mut self.follow_up,
            ReplyField::Correction => &mut self.correction,
        }
    }

    /// True when no field carries content.
    pub fn is_empty(&self) -> bool {
        ReplyField::ALL
            .iter()
            .all(|field| self.field(*field).is_empty())
    }

    /// Render non-empty fields as `LABEL: value` lines in contract order.
    pub fn render(&self, labels: &ReplyLabels) -> String {
        ReplyField::ALL
            .iter()
            .filter(|field| !self.field(**field).is_empty())
            .map(|field| format!("{}: {}", labels.label(*field), self.field(*field)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reference document attached to a completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRef {
    /// Index-derived identifier.
    pub id: String,
    /// Truncated document text.
    pub text: String,
    /// Display metadata.
    pub metadata: DocumentMetadata,
}

/// Title and origin of a reference document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub origin: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let turn = ConversationTurn::assistant("hi");
        let value = serde_json::to_value(&turn).expect("serialize");
        assert_eq!(value, json!({ "role": "assistant", "content": "hi" }));
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn render_skips_empty_fields() {
        let reply = ParsedReply::new("Hi there.", "", "How are you?", "OK");
        assert_eq!(
            reply.render(&ReplyLabels::default()),
            "EN: Hi there.\nASK: How are you?\nFIX: OK"
        );
    }

    #[test]
    fn labels_deserialize_with_defaults() {
        let labels: ReplyLabels =
            serde_json::from_value(json!({ "translation": "FR" })).expect("labels");
        assert_eq!(labels.label(ReplyField::Answer), "EN");
        assert_eq!(labels.label(ReplyField::Translation), "FR");
        assert!(ParsedReply::default().is_empty());
    }
}
