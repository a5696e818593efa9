//! Routing of turns to the transcript and speech collaborators.

use async_trait::async_trait;
use friday_rs_config::SpeechConfig;
use friday_rs_protocol::{
    ParsedReply, ReplyLabels, Role, SpeechError, SpeechRequest, SpeechSink, TranscriptEntry,
    TranscriptSink,
};
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Sends user turns and replies to the transcript, and reply answers to speech.
#[derive(Clone)]
pub struct OutputDispatcher {
    transcript: Arc<dyn TranscriptSink>,
    speech: Arc<dyn SpeechSink>,
    labels: ReplyLabels,
    voice: SpeechConfig,
}

impl OutputDispatcher {
    pub fn new(
        transcript: Arc<dyn TranscriptSink>,
        speech: Arc<dyn SpeechSink>,
        labels: ReplyLabels,
        voice: SpeechConfig,
    ) -> Self {
        Self {
            transcript,
            speech,
            labels,
            voice,
        }
    }

    /// Append the user's utterance as plain text.
    pub fn user_turn(&self, text: &str) {
        self.transcript.append(TranscriptEntry {
            role: Role::User,
            text: text.to_string(),
            reply: None,
        });
    }

    /// Append a reply with each non-empty field on its own labeled line.
    pub fn assistant_turn(&self, reply: &ParsedReply) {
        self.transcript.append(TranscriptEntry {
            role: Role::Assistant,
            text: reply.render(&self.labels),
            reply: Some(reply.clone()),
        });
    }

    /// Speak the answer field, or the raw text when the answer is empty.
    ///
    /// Waits for the utterance to finish. Failures are logged and dropped.
    pub async fn speak(&self, reply: &ParsedReply, raw: &str) {
        let text = if reply.answer.is_empty() {
            raw.trim()
        } else {
            reply.answer.as_str()
        };
        if text.is_empty() {
            return;
        }
        let request = SpeechRequest {
            text: text.to_string(),
            language: self.voice.language.clone(),
            rate: self.voice.rate,
            pitch: self.voice.pitch,
        };
        match self.speech.speak(request).await {
            Ok(()) => {}
            Err(SpeechError::Superseded) => debug!("speech superseded by a newer utterance"),
            Err(err) => warn!("speech failed (error={})", err),
        }
    }
}

/// Speech sink wrapper where a new utterance cancels the one still playing.
pub struct SupersedingSpeech {
    inner: Arc<dyn SpeechSink>,
    current: Mutex<Option<AbortHandle>>,
}

impl SupersedingSpeech {
    pub fn new(inner: Arc<dyn SpeechSink>) -> Self {
        Self {
            inner,
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SpeechSink for SupersedingSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.speak(request).await });
        if let Some(previous) = self.current.lock().replace(task.abort_handle()) {
            previous.abort();
        }
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(SpeechError::Superseded),
            Err(err) => Err(SpeechError::Unavailable(err.to_string())),
        }
    }
}
