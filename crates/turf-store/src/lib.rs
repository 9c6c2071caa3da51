pub mod discovery;
pub mod error;
pub mod ledger;
pub mod schema;
pub mod store;
pub mod territory;

pub use discovery::{DiscoveryEngine, NearbyEntry};
pub use error::{Result, StoreError};
pub use ledger::ScoreLedger;
pub use store::{ProfileRecord, Store};
pub use territory::{CaptureOutcome, TerritoryEngine};
