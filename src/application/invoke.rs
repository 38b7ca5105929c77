use anyhow::Context;

use crate::domain::ParcelStatus;
use crate::events::EventSink;
use crate::identity::Identity;
use crate::storage::StateStore;

use super::{LedgerError, ParcelLedger};

/// Invocable function names and their argument counts.
pub const FUNCTIONS: &[(&str, usize)] = &[
    ("initLedger", 0),
    ("createParcel", 2),
    ("transport", 2),
    ("changeStatus", 2),
    ("queryParcel", 1),
];

/// Parse a status argument, accepting any letter case.
pub fn parse_status(s: &str) -> Result<ParcelStatus, LedgerError> {
    ParcelStatus::from_str(s).ok_or_else(|| {
        let valid: Vec<&str> = ParcelStatus::ALL.iter().map(|s| s.as_str()).collect();
        LedgerError::InvalidArgument(format!(
            "Invalid status '{}'. Must be one of: {}",
            s,
            valid.join(", ")
        ))
    })
}

impl<S: StateStore, E: EventSink> ParcelLedger<S, E> {
    /// String invocation surface: call `function` with positional string
    /// arguments and get the serialized parcel back.
    ///
    /// `initLedger` returns an empty string.
    pub async fn invoke(
        &self,
        caller: &impl Identity,
        function: &str,
        args: &[String],
    ) -> Result<String, LedgerError> {
        let parcel = match (function, args) {
            ("initLedger", []) => {
                self.init_ledger().await?;
                return Ok(String::new());
            }
            ("createParcel", [id, destination]) => {
                self.create_parcel(caller, id, destination).await?
            }
            ("transport", [id, new_address]) => self.transport(id, new_address).await?,
            ("changeStatus", [id, status]) => {
                let status = parse_status(status)?;
                self.change_status(id, status).await?
            }
            ("queryParcel", [id]) => self.query_parcel(id).await?,
            (name, _) => return Err(bad_call(name, args.len())),
        };

        let json = serde_json::to_string(&parcel).context("Failed to encode parcel")?;
        Ok(json)
    }
}

fn bad_call(function: &str, given: usize) -> LedgerError {
    match FUNCTIONS.iter().find(|(name, _)| *name == function) {
        Some((name, expected)) => LedgerError::InvalidArgument(format!(
            "{} expects {} argument(s), got {}",
            name, expected, given
        )),
        None => LedgerError::InvalidArgument(format!("Unknown function: {}", function)),
    }
}
