use serde::{Deserialize, Serialize};

use super::ParcelId;

/// Name under which delivery notifications are emitted.
pub const DISTRIBUTION_EVENT: &str = "Distribution";

pub const DELIVERED_MSG: &str = "Delivered";

/// Payload of a `Distribution` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEvent {
    pub id: ParcelId,
    pub msg: String,
}

impl DistributionEvent {
    pub fn delivered(id: impl Into<ParcelId>) -> Self {
        Self {
            id: id.into(),
            msg: DELIVERED_MSG.to_string(),
        }
    }
}
