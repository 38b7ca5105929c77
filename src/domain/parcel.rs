use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address every parcel starts at.
pub const SORTING_CENTER: &str = "Sorting Center";

/// Document type tag written into every stored parcel record.
pub const PARCEL_DOC_TYPE: &str = "parcel";

pub type ParcelId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParcelStatus {
    Good,
    Damaged,
    /// Terminal: no further status changes are accepted.
    Destroyed,
}

/// The lifecycle rule a rejected status change ran into.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRule {
    #[error("Parcel is DESTROYED")]
    Destroyed,

    #[error("Cannot repair DAMAGED parcel")]
    DamagedToGood,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 3] = [
        ParcelStatus::Good,
        ParcelStatus::Damaged,
        ParcelStatus::Destroyed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Good => "GOOD",
            ParcelStatus::Damaged => "DAMAGED",
            ParcelStatus::Destroyed => "DESTROYED",
        }
    }

    /// Case-insensitive parse, the way the command line accepts statuses.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GOOD" => Some(ParcelStatus::Good),
            "DAMAGED" => Some(ParcelStatus::Damaged),
            "DESTROYED" => Some(ParcelStatus::Destroyed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Destroyed)
    }

    /// Checks a status change against the lifecycle.
    ///
    /// ```text
    /// GOOD      -> GOOD | DAMAGED | DESTROYED
    /// DAMAGED   -> DAMAGED | DESTROYED
    /// DESTROYED -> (nothing, not even DESTROYED)
    /// ```
    pub fn check_transition(&self, next: ParcelStatus) -> Result<(), TransitionRule> {
        match (self, next) {
            (ParcelStatus::Destroyed, _) => Err(TransitionRule::Destroyed),
            (ParcelStatus::Damaged, ParcelStatus::Good) => Err(TransitionRule::DamagedToGood),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked shipment. Serialized field names and order are the stored
/// document format shared with external tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub doc_type: String,
    pub id: ParcelId,
    pub destination: String,
    pub current_address: String,
    pub status: ParcelStatus,
    /// Identity of the creator, opaque to the ledger.
    pub owner: String,
}

impl Parcel {
    pub fn new(
        id: impl Into<ParcelId>,
        destination: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: PARCEL_DOC_TYPE.to_string(),
            id: id.into(),
            destination: destination.into(),
            current_address: SORTING_CENTER.to_string(),
            status: ParcelStatus::Good,
            owner: owner.into(),
        }
    }

    /// Moves the parcel. Returns true when the new address is the destination.
    pub fn move_to(&mut self, address: impl Into<String>) -> bool {
        self.current_address = address.into();
        self.is_delivered()
    }

    pub fn set_status(&mut self, next: ParcelStatus) -> Result<(), TransitionRule> {
        self.status.check_transition(next)?;
        self.status = next;
        Ok(())
    }

    pub fn is_delivered(&self) -> bool {
        self.current_address == self.destination
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a stored record, refusing documents of any other type.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        let parcel: Parcel = serde_json::from_slice(bytes)?;
        if parcel.doc_type != PARCEL_DOC_TYPE {
            return Err(serde::de::Error::custom(format!(
                "unexpected docType '{}'",
                parcel.doc_type
            )));
        }
        Ok(parcel)
    }
}
