// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod ai;
pub mod api;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod error;
pub mod event;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod query;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::event::{Event, IdStrategy};
pub use crate::ingest::types::{RawItem, SourceProvider};
pub use crate::outcome::{FallbackReason, Outcome};
pub use crate::pipeline::{Aggregator, RunOutcome, RunReport};
pub use crate::snapshot::{Snapshot, SnapshotStore};
