//! Background paginated order synchronisation

pub mod engine;

pub use engine::{PaginatedSyncEngine, SyncEngineConfig, SyncHandle, SyncOutcome, SyncReport};
