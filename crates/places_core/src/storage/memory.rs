//! In-memory key-value storage.

use super::{KeyValueStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// `HashMap`-backed storage. Contents vanish with the process.
///
/// Reads and writes can be made to fail on demand, which lets callers
/// exercise storage faults without a real device.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one raw value, bypassing write-failure injection.
    pub fn with_entry(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        storage
    }

    /// When `true`, every `get` returns `StorageError::Unavailable`.
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// When `true`, every `set`/`remove` returns `StorageError::Unavailable`.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "write rejected by memory storage".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "read rejected by memory storage".to_string(),
            ));
        }
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory entries"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check_writable()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory entries"))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory entries"))?;
        entries.remove(key);
        Ok(())
    }
}
