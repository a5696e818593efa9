//! Long-term memory for Friday: per-user recent messages and topic counters.

pub mod error;
pub mod long_term;
pub mod model;
pub mod policy;
pub mod store;
pub mod topics;

/// Memory error type.
pub use error::MemoryError;
/// Long-term memory store and summary sentinel.
pub use long_term::{DEFAULT_STORAGE_KEY, LongTermMemory, NO_MEMORY_SENTINEL};
/// Memory record and event model.
pub use model::{MemoryEvent, MemoryRecord, TopicCount};
/// Retention and summary limits.
pub use policy::MemoryPolicy;
/// Key-value storage backends.
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
