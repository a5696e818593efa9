//! Terminal collaborators: printed transcript, printed speech, and a local
//! user context built from command-line flags.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use friday_rs::protocol::{
    Role, SpeechError, SpeechRequest, SpeechSink, StudySource, TranscriptEntry, TranscriptSink,
    UserContext, UserProfile,
};
use std::fs;
use std::path::Path;

pub struct ConsoleTranscript;

impl TranscriptSink for ConsoleTranscript {
    fn append(&self, entry: TranscriptEntry) {
        match entry.role {
            Role::User => println!("You: {}", entry.text),
            Role::Assistant | Role::System => println!("Friday\n{}\n", entry.text),
        }
    }
}

/// Prints utterances instead of synthesizing audio.
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechSink for ConsoleSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        println!(
            "[speak {} rate={} pitch={}] {}",
            request.language, request.rate, request.pitch, request.text
        );
        Ok(())
    }
}

/// Profile from `--name` and study sources from `--source` files.
pub struct LocalUserContext {
    name: Option<String>,
    sources: Vec<StudySource>,
}

impl LocalUserContext {
    pub fn new(name: Option<String>, sources: Vec<StudySource>) -> Self {
        Self { name, sources }
    }
}

impl UserContext for LocalUserContext {
    fn profile(&self) -> Option<UserProfile> {
        self.name.as_ref().map(|name| UserProfile {
            name: name.clone(),
            study_sources: self.sources.len(),
            ..UserProfile::default()
        })
    }

    fn study_sources(&self) -> Vec<StudySource> {
        self.sources.clone()
    }
}

/// Read a text file as a study source titled by its file stem.
pub fn load_source(path: &Path) -> anyhow::Result<StudySource> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read study source {}", path.display()))?;
    Ok(StudySource {
        title: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
        origin: Some(path.display().to_string()),
        content: content.trim().to_string(),
        created_at: Some(Utc::now()),
    })
}
