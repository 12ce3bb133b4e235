//! Run-state mirroring, snapshots and retention.
//!
//! `StateTracker` aggregates graph version, phase, tasks, worker heartbeats
//! and event history into one inspectable `TeamState`. The snapshot and
//! retention functions reduce that state to a bounded derived view.

mod snapshot;
mod tracker;

pub use snapshot::{
    RetentionResult, SNAPSHOT_SCHEMA_VERSION, StateSnapshot, apply_retention_policy,
    create_team_state_snapshot,
};
pub use tracker::{Heartbeat, StateTracker, TeamState, WorkerStatus};
