//! Error types for the conversation core.

use crate::completion::CompletionError;
use friday_rs_memory::MemoryError;
use thiserror::Error;

/// Errors returned by session construction and explicit session operations.
///
/// Turn processing never fails; these surface only from setup and from
/// operations that are defined to refuse work, such as connection tests.
#[derive(Debug, Error)]
pub enum FridayCoreError {
    /// No API credential is configured for the completion endpoint.
    #[error("no API key configured for the completion endpoint")]
    MissingCredential,
    /// A required collaborator was not supplied to the session builder.
    #[error("session builder is missing {0}")]
    MissingCollaborator(&'static str),
    /// Completion client setup failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    /// Memory backend setup failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}
