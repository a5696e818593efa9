//! Test helpers shared across Friday crates.

pub mod completion;
pub mod context;
pub mod sinks;
pub mod store;

pub use completion::{FailingCompletion, RecordingCompletion};
pub use context::StaticUserContext;
pub use sinks::{FailingSpeech, RecordingSpeech, RecordingTranscript};
pub use store::FailingStore;
