use crate::{ParsedReply, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Utterance submitted to a speech synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// BCP-47 voice language.
    pub language: String,
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
}

/// Errors surfaced by speech sinks.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The synthesizer is missing or refused the utterance.
    #[error("speech unavailable: {0}")]
    Unavailable(String),
    /// The utterance was replaced by a newer one before it finished.
    #[error("speech superseded")]
    Superseded,
}

/// Text-to-speech collaborator. Resolves once the utterance has finished.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak a single utterance.
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError>;
}

/// Rendered line of the conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Speaker role.
    pub role: Role,
    /// Display text (labeled lines for assistant replies).
    pub text: String,
    /// Structured reply for assistant entries.
    #[serde(default)]
    pub reply: Option<ParsedReply>,
}

/// Sink interface for transcript rendering.
pub trait TranscriptSink: Send + Sync {
    /// Append an entry to the visible transcript.
    fn append(&self, entry: TranscriptEntry);
}
