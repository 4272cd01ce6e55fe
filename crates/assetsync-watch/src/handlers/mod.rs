//! Orchestration handlers consuming lifecycle events.

mod sync;

pub use sync::SyncHandler;
