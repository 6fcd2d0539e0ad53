pub mod record;
pub mod snapshot;

pub use record::{RawRecord, StateField};
pub use snapshot::StateSnapshot;
