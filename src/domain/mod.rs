mod event;
mod parcel;

pub use event::*;
pub use parcel::*;
