//! Orchestration core for multi-agent team runs.
//!
//! Coordinates execution of interdependent tasks assigned to autonomous
//! workers: a dependency-aware scheduler with optimistic versioning, a
//! run-phase state machine, a sequenced event log with snapshotting and
//! retention, durable recovery checkpoints, and a regression-gate evaluator.
//! The core manages bookkeeping only — dispatching work to real workers,
//! sandboxing and transport are driven externally.

pub mod checkpoint;
pub mod error;
pub mod event;
pub mod gates;
pub mod graph;
pub mod phase;
pub mod run;
pub mod state;

pub use checkpoint::{
    CHECKPOINT_SCHEMA_VERSION, Checkpoint, CheckpointFields, CheckpointStore, checkpoint_path,
    validate_checkpoint,
};
pub use error::{Result, TeamRunError};
pub use event::{Event, EventBus};
pub use gates::{
    GateResult, RegressionGateReport, RegressionGateSignals, evaluate_mvp_regression_gates,
};
pub use graph::{TaskGraph, TaskStatus, TeamTask};
pub use phase::{RuntimePhase, RuntimePhaseMachine};
pub use run::TeamRunCoordinator;
pub use state::{
    Heartbeat, RetentionResult, StateSnapshot, StateTracker, TeamState, WorkerStatus,
    apply_retention_policy, create_team_state_snapshot,
};
