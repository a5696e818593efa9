use async_trait::async_trait;
use friday_rs_memory::{KeyValueStore, MemoryError};
use parking_lot::Mutex;

/// Store whose reads and writes fail; counts write attempts.
#[derive(Debug, Default)]
pub struct FailingStore {
    writes: Mutex<usize>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_attempts(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, MemoryError> {
        Err(MemoryError::Backend("read refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), MemoryError> {
        *self.writes.lock() += 1;
        Err(MemoryError::Backend("quota exceeded".to_string()))
    }
}
