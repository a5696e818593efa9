//! Conversation orchestration core for Friday.
//!
//! This crate owns the session pipeline: system prompt and document context
//! construction, the completion request cycle, structured reply parsing, and
//! delivery of replies to transcript, speech, and long-term memory.

pub mod completion;
pub mod dispatch;
pub mod documents;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod reply;
pub mod session;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, HttpCompletionClient};
pub use dispatch::{OutputDispatcher, SupersedingSpeech};
pub use documents::build_documents;
pub use error::FridayCoreError;
pub use fallback::ReplyKind;
pub use prompt::{NO_PROFILE_TEXT, PromptBuilder, render_profile};
pub use reply::ReplyParser;
pub use session::{
    ConversationSession, SessionBuilder, SessionState, TurnOutcome, memory_from_config,
};
