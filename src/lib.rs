pub mod application;
pub mod cli;
pub mod domain;
pub mod events;
pub mod identity;
pub mod storage;

pub use application::{LedgerError, ParcelLedger};
pub use domain::*;
pub use storage::{MemoryStore, SqliteStore, StateStore};
