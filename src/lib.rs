pub mod api;
pub mod consumers;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod poller;
pub mod slot;

pub use error::{PollerError, Result};
pub use models::{Config, RawResponse, Snapshot};
pub use poller::{PollerState, PollerStats, PortfolioPoller};
pub use slot::SnapshotSlot;
