// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use postal::application::{ParcelLedger, Registrar};
use postal::domain::DistributionEvent;
use postal::events::{BroadcastSink, LedgerEvent};
use postal::identity::{StaticIdentity, DEFAULT_MSP_ID};
use postal::storage::{IdentityRepository, SqliteStore, StateStore, Version};
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;

pub type TestLedger = ParcelLedger<SqliteStore, BroadcastSink>;

/// Helper to create a ledger over a temporary database
pub async fn test_ledger() -> Result<(TestLedger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init_path(db_path.to_str().unwrap()).await?;
    Ok((ParcelLedger::new(store, BroadcastSink::default()), temp_dir))
}

/// Registrar sharing the ledger's database
pub fn test_registrar(ledger: &TestLedger) -> Registrar {
    let repo = IdentityRepository::new(ledger.store().pool().clone());
    Registrar::new(repo, DEFAULT_MSP_ID)
}

pub fn postal_worker() -> StaticIdentity {
    StaticIdentity::new("x509::/OU=employee/CN=postalWorker::/O=Org1MSP")
}

/// Collect every Distribution event received so far
pub fn drain_distributions(rx: &mut Receiver<LedgerEvent>) -> Vec<DistributionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Some(distribution) = event.as_distribution() {
            events.push(distribution);
        }
    }
    events
}

/// Write counter of a stored key
pub async fn stored_version(ledger: &TestLedger, key: &str) -> Result<Option<Version>> {
    Ok(ledger
        .store()
        .get_versioned(key)
        .await?
        .map(|stored| stored.version))
}
