use async_trait::async_trait;
use friday_rs_protocol::{
    SpeechError, SpeechRequest, SpeechSink, TranscriptEntry, TranscriptSink,
};
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RecordingSpeech {
    requests: Mutex<Vec<SpeechRequest>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.text.clone())
            .collect()
    }
}

#[async_trait]
impl SpeechSink for RecordingSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        self.requests.lock().push(request);
        Ok(())
    }
}

/// Speech sink that is never available.
#[derive(Debug, Default)]
pub struct FailingSpeech;

#[async_trait]
impl SpeechSink for FailingSpeech {
    async fn speak(&self, _request: SpeechRequest) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable("no synthesizer".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingTranscript {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl RecordingTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.text.clone())
            .collect()
    }
}

impl TranscriptSink for RecordingTranscript {
    fn append(&self, entry: TranscriptEntry) {
        self.entries.lock().push(entry);
    }
}
