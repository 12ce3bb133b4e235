use serde::{Deserialize, Serialize};

use super::TeamState;
use crate::error::{Result, TeamRunError};
use crate::event::Event;
use crate::graph::TeamTask;
use crate::phase::RuntimePhase;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Compact, immutable reduction of a run's state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub schema_version: u32,
    pub run_id: String,
    pub graph_version: u64,
    pub phase: Option<RuntimePhase>,
    pub task_count: usize,
    /// Total events ever observed; retention never rewrites this.
    pub event_count: usize,
    pub last_event_id: Option<String>,
    pub tasks: Vec<TeamTask>,
}

/// Outcome of applying a retention policy to a run's event history.
#[derive(Debug, Clone)]
pub struct RetentionResult {
    pub snapshot: StateSnapshot,
    /// Tail slice of the event log, oldest of the retained set first.
    pub retained_events: Vec<Event>,
    pub truncated_count: usize,
}

pub fn create_team_state_snapshot(state: &TeamState) -> StateSnapshot {
    StateSnapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        run_id: state.run_id.clone(),
        graph_version: state.graph_version,
        phase: state.phase,
        task_count: state.tasks.len(),
        event_count: state.events.len(),
        last_event_id: state.events.last().map(|e| e.id.clone()),
        tasks: state.tasks.clone(),
    }
}

/// Bounds the carried-forward event history to the last `retain_last_events`
/// entries. The snapshot's `event_count` still reports the total observed,
/// so consumers can distinguish "how much happened" from "how much we kept".
/// Zero is valid and retains nothing; negative values error.
pub fn apply_retention_policy(
    state: &TeamState,
    retain_last_events: i64,
) -> Result<RetentionResult> {
    if retain_last_events < 0 {
        return Err(TeamRunError::InvalidRetention(retain_last_events));
    }

    let snapshot = create_team_state_snapshot(state);
    let keep = (retain_last_events as usize).min(state.events.len());
    let retained_events = state.events[state.events.len() - keep..].to_vec();
    let truncated_count = state.events.len() - keep;

    Ok(RetentionResult {
        snapshot,
        retained_events,
        truncated_count,
    })
}
