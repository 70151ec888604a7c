//! Store errors and index bookkeeping.

pub mod errors;
pub mod index;
pub mod precondition;

pub use errors::{StoreError, StoreResult};
pub use index::{IndexDelta, IndexEntry};
pub use precondition::{Precondition, PreconditionFailure};
