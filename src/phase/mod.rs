//! Run-phase finite-state machine.

mod machine;

pub use machine::{RuntimePhase, RuntimePhaseMachine};
