use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Event;
use crate::graph::TeamTask;
use crate::phase::RuntimePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    #[default]
    Idle,
    Busy,
}

/// Last-write-wins liveness record, one per worker.
///
/// The core keeps no expiry logic; staleness detection is an external policy
/// that consumes these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub worker_id: String,
    pub status: WorkerStatus,
    /// The task currently claimed, if any.
    pub task_id: Option<String>,
    /// Retry counter reported by the worker.
    pub attempt: u32,
}

impl Heartbeat {
    pub fn idle(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            status: WorkerStatus::Idle,
            task_id: None,
            attempt: 0,
        }
    }

    pub fn busy(worker_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            status: WorkerStatus::Busy,
            task_id: Some(task_id.into()),
            attempt: 0,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// Aggregated, inspectable state of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamState {
    pub run_id: String,
    pub goal: String,
    pub graph_version: u64,
    pub phase: Option<RuntimePhase>,
    pub tasks: Vec<TeamTask>,
    pub heartbeats: HashMap<String, Heartbeat>,
    pub events: Vec<Event>,
}

/// Passive mirror of a run's graph, phase, heartbeats and event history.
///
/// Updates are pushed by the scheduler and phase machine; no validation
/// happens here (phase legality is the phase machine's job). The event list
/// only grows through `add_event`.
pub struct StateTracker {
    state: TeamState,
}

impl StateTracker {
    pub fn new(run_id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            state: TeamState {
                run_id: run_id.into(),
                goal: goal.into(),
                graph_version: 0,
                phase: None,
                tasks: Vec::new(),
                heartbeats: HashMap::new(),
                events: Vec::new(),
            },
        }
    }

    pub fn set_graph_version(&mut self, version: u64) {
        self.state.graph_version = version;
    }

    pub fn set_phase(&mut self, phase: RuntimePhase) {
        self.state.phase = Some(phase);
    }

    /// Full replace, preserving the supplied order.
    pub fn set_tasks(&mut self, tasks: Vec<TeamTask>) {
        self.state.tasks = tasks;
    }

    pub fn upsert_heartbeat(&mut self, heartbeat: Heartbeat) {
        debug!(worker_id = %heartbeat.worker_id, "Heartbeat upserted");
        self.state
            .heartbeats
            .insert(heartbeat.worker_id.clone(), heartbeat);
    }

    pub fn add_event(&mut self, event: Event) {
        self.state.events.push(event);
    }

    pub fn run_id(&self) -> &str {
        &self.state.run_id
    }

    pub fn goal(&self) -> &str {
        &self.state.goal
    }

    pub fn graph_version(&self) -> u64 {
        self.state.graph_version
    }

    pub fn phase(&self) -> Option<RuntimePhase> {
        self.state.phase
    }

    pub fn tasks(&self) -> &[TeamTask] {
        &self.state.tasks
    }

    pub fn heartbeats(&self) -> &HashMap<String, Heartbeat> {
        &self.state.heartbeats
    }

    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    /// Point-in-time copy. Later tracker mutation never affects a snapshot
    /// already handed out.
    pub fn snapshot(&self) -> TeamState {
        self.state.clone()
    }
}
