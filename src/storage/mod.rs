mod identities;
mod memory;
mod sqlite;

pub use identities::*;
pub use memory::*;
pub use sqlite::*;

use anyhow::Result;

/// SQL migration for the key-value world state
pub const MIGRATION_001_WORLD_STATE: &str = include_str!("migrations/001_world_state.sql");

/// SQL migration for enrolled identities
pub const MIGRATION_002_IDENTITIES: &str = include_str!("migrations/002_identities.sql");

/// Write counter of a stored value, bumped on every write.
pub type Version = i64;

/// A stored value together with its write counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: Vec<u8>,
    pub version: Version,
}

/// Exact-match key-value storage the ledger runs against.
///
/// Implementations must give read-your-writes consistency within one
/// operation and durability once a write returns. `put_if_version` must be
/// atomic with respect to every other writer of the same store, including
/// other processes sharing it.
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Returns the stored value and its version, or `None` if the key was
    /// never written.
    async fn get_versioned(&self, key: &str) -> Result<Option<Versioned>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Replaces the value under `key` only if its version is still
    /// `expected`. Returns `false`, writing nothing, when another writer got
    /// there first or the key is gone.
    async fn put_if_version(&self, key: &str, value: &[u8], expected: Version) -> Result<bool>;

    /// Returns the stored bytes, or `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_versioned(key).await?.map(|stored| stored.value))
    }
}
