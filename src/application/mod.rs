// Application layer - the parcel ledger operations and caller enrollment.

pub mod error;
mod invoke;
mod registrar;
mod service;

pub use error::*;
pub use invoke::*;
pub use registrar::*;
pub use service::*;
