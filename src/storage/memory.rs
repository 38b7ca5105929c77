use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::{StateStore, Version, Versioned};

/// Process-local state store, mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Versioned>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Versioned>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl StateStore for MemoryStore {
    async fn get_versioned(&self, key: &str) -> Result<Option<Versioned>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries()?;
        let version = entries.get(key).map_or(1, |stored| stored.version + 1);
        entries.insert(
            key.to_string(),
            Versioned {
                value: value.to_vec(),
                version,
            },
        );
        Ok(())
    }

    async fn put_if_version(&self, key: &str, value: &[u8], expected: Version) -> Result<bool> {
        let mut entries = self.entries()?;
        match entries.get_mut(key) {
            Some(stored) if stored.version == expected => {
                stored.value = value.to_vec();
                stored.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
