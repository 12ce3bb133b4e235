//! Durable recovery checkpoints.
//!
//! A checkpoint captures enough state (goal, phase, policy profile, pending
//! task ids) to resume a crashed run without replaying its event log.
//! Readers reject unknown schema versions defensively.

mod store;
mod types;

pub use store::{CheckpointStore, checkpoint_path};
pub use types::{
    CHECKPOINT_SCHEMA_VERSION, Checkpoint, CheckpointFields, RawCheckpoint, validate_checkpoint,
};
