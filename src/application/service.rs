use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{DistributionEvent, Parcel, ParcelStatus, DISTRIBUTION_EVENT};
use crate::events::EventSink;
use crate::identity::Identity;
use crate::storage::{StateStore, Version};

use super::LedgerError;

/// How many times a mutation re-reads and retries after losing a write race.
const MAX_WRITE_ATTEMPTS: usize = 8;

/// The parcel ledger: four operations over a key-value store, one record
/// per parcel id.
///
/// Every operation reads at most one key and writes at most one key.
/// Mutations are optimistic: the record is re-read and the change re-applied
/// whenever the store reports that its version moved since the read, so a
/// status check always holds against the state that is actually replaced.
/// Within one ledger a write lock also keeps mutations from racing each other.
pub struct ParcelLedger<S, E> {
    store: S,
    sink: E,
    write_lock: Mutex<()>,
}

impl<S: StateStore, E: EventSink> ParcelLedger<S, E> {
    pub fn new(store: S, sink: E) -> Self {
        Self {
            store,
            sink,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Ledger initializer. There is no seed data.
    pub async fn init_ledger(&self) -> Result<(), LedgerError> {
        debug!("init_ledger");
        Ok(())
    }

    /// Create a parcel at the sorting center, owned by `caller`.
    ///
    /// An existing record with the same id is overwritten.
    pub async fn create_parcel(
        &self,
        caller: &impl Identity,
        id: &str,
        destination: &str,
    ) -> Result<Parcel, LedgerError> {
        require("id", id)?;
        require("destination", destination)?;
        debug!(id, destination, "create_parcel");

        let parcel = Parcel::new(id, destination, caller.id());

        let _guard = self.write_lock.lock().await;
        self.write(&parcel).await?;
        Ok(parcel)
    }

    /// Move a parcel to `new_address`.
    ///
    /// Emits a `Distribution` event whenever the new address equals the
    /// destination, including repeated moves to the same address.
    pub async fn transport(&self, id: &str, new_address: &str) -> Result<Parcel, LedgerError> {
        require("id", id)?;
        require("new address", new_address)?;
        debug!(id, new_address, "transport");

        let parcel = self
            .modify(id, |parcel| {
                parcel.move_to(new_address);
                Ok(())
            })
            .await?;

        if parcel.is_delivered() {
            let payload = serde_json::to_vec(&DistributionEvent::delivered(id))
                .context("Failed to encode distribution event")?;
            self.sink.emit(DISTRIBUTION_EVENT, &payload);
            info!(id, address = new_address, "parcel delivered");
        }

        Ok(parcel)
    }

    /// Change a parcel's status, enforcing the lifecycle.
    pub async fn change_status(
        &self,
        id: &str,
        new_status: ParcelStatus,
    ) -> Result<Parcel, LedgerError> {
        require("id", id)?;
        debug!(id, status = %new_status, "change_status");

        self.modify(id, |parcel| {
            parcel.set_status(new_status).map_err(|rule| {
                debug!(id, from = %parcel.status, to = %new_status, %rule, "status change rejected");
                LedgerError::InvalidTransition {
                    id: id.to_string(),
                    rule,
                }
            })
        })
        .await
    }

    /// Read a parcel.
    pub async fn query_parcel(&self, id: &str) -> Result<Parcel, LedgerError> {
        require("id", id)?;
        debug!(id, "query_parcel");
        self.read(id).await
    }

    async fn read(&self, id: &str) -> Result<Parcel, LedgerError> {
        self.read_versioned(id).await.map(|(parcel, _)| parcel)
    }

    async fn read_versioned(&self, id: &str) -> Result<(Parcel, Version), LedgerError> {
        let stored = self
            .store
            .get_versioned(id)
            .await?
            .filter(|stored| !stored.value.is_empty())
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let parcel = Parcel::from_bytes(&stored.value).map_err(|source| LedgerError::Corrupt {
            key: id.to_string(),
            source,
        })?;
        Ok((parcel, stored.version))
    }

    /// Read-modify-write of one existing parcel. `apply` runs against the
    /// freshest record on every attempt; an error from it aborts without
    /// writing.
    async fn modify<F>(&self, id: &str, mut apply: F) -> Result<Parcel, LedgerError>
    where
        F: FnMut(&mut Parcel) -> Result<(), LedgerError>,
    {
        let _guard = self.write_lock.lock().await;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut parcel, version) = self.read_versioned(id).await?;
            apply(&mut parcel)?;

            let bytes = parcel.to_bytes().context("Failed to encode parcel")?;
            if self.store.put_if_version(id, &bytes, version).await? {
                return Ok(parcel);
            }
            debug!(id, attempt, "write conflict, retrying");
        }

        Err(LedgerError::Conflict(id.to_string()))
    }

    async fn write(&self, parcel: &Parcel) -> Result<(), LedgerError> {
        let bytes = parcel.to_bytes().context("Failed to encode parcel")?;
        self.store.put(&parcel.id, &bytes).await?;
        Ok(())
    }
}

fn require(name: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}
