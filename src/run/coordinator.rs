use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use tracing::info;

use crate::checkpoint::{Checkpoint, CheckpointFields};
use crate::error::Result;
use crate::event::EventBus;
use crate::graph::{TaskGraph, TaskStatus, TeamTask};
use crate::phase::{RuntimePhase, RuntimePhaseMachine};
use crate::state::{Heartbeat, RetentionResult, StateTracker, TeamState, apply_retention_policy};

const SOURCE_SCHEDULER: &str = "scheduler";
const SOURCE_ORCHESTRATOR: &str = "orchestrator";
const SOURCE_TEAM: &str = "team";

struct RunCore {
    graph: TaskGraph,
    machine: RuntimePhaseMachine,
    bus: EventBus,
    tracker: StateTracker,
}

impl RunCore {
    fn record(&mut self, event_type: &str, source: &str, payload: serde_json::Value) {
        let event = self.bus.emit(event_type, source, payload);
        self.tracker.add_event(event);
    }

    fn mirror_graph(&mut self) {
        self.tracker.set_graph_version(self.graph.version());
        self.tracker.set_tasks(self.graph.tasks().to_vec());
    }
}

/// Single-writer front door for one team run.
///
/// Owns the task graph, phase machine, event bus and state tracker behind
/// one mutation lock, so concurrent workers interacting through claims,
/// submissions and heartbeats preserve the version-per-mutation and
/// event-ordering invariants. Every state-changing call appends exactly one
/// event; a rejected call appends none and mirrors nothing.
pub struct TeamRunCoordinator {
    core: Mutex<RunCore>,
}

impl TeamRunCoordinator {
    pub fn new(
        run_id: impl Into<String>,
        goal: impl Into<String>,
        tasks: Vec<TeamTask>,
    ) -> Result<Self> {
        let run_id = run_id.into();
        let goal = goal.into();
        let graph = TaskGraph::new(tasks)?;
        let machine = RuntimePhaseMachine::new();
        let mut tracker = StateTracker::new(run_id.clone(), goal.clone());
        let mut bus = EventBus::new();

        tracker.set_phase(machine.current());
        tracker.set_tasks(graph.tasks().to_vec());
        tracker.add_event(bus.emit(
            "run_started",
            SOURCE_ORCHESTRATOR,
            json!({ "goal": goal, "task_count": graph.tasks().len() }),
        ));

        info!(run_id, "Team run started");
        Ok(Self {
            core: Mutex::new(RunCore {
                graph,
                machine,
                bus,
                tracker,
            }),
        })
    }

    /// Reconstructs a coordinator from a recovery checkpoint, starting at
    /// the checkpointed phase. The task list is caller-supplied; the
    /// checkpoint only carries pending ids.
    pub fn resume_from(
        run_id: impl Into<String>,
        checkpoint: &Checkpoint,
        tasks: Vec<TeamTask>,
    ) -> Result<Self> {
        let run_id = run_id.into();
        let graph = TaskGraph::new(tasks)?;
        let machine = RuntimePhaseMachine::with_initial(checkpoint.phase);
        let mut tracker = StateTracker::new(run_id.clone(), checkpoint.goal.clone());
        let mut bus = EventBus::new();

        tracker.set_phase(machine.current());
        tracker.set_tasks(graph.tasks().to_vec());
        tracker.add_event(bus.emit(
            "run_resumed",
            SOURCE_ORCHESTRATOR,
            json!({
                "checkpoint_id": checkpoint.checkpoint_id,
                "phase": checkpoint.phase.as_str(),
                "pending_count": checkpoint.pending_tasks.len(),
            }),
        ));

        info!(run_id, checkpoint_id = checkpoint.checkpoint_id, "Team run resumed");
        Ok(Self {
            core: Mutex::new(RunCore {
                graph,
                machine,
                bus,
                tracker,
            }),
        })
    }

    /// Claims up to `max_count` ready tasks for a worker, stamping the
    /// assignee and a busy heartbeat. Emits nothing on an empty claim.
    pub fn claim_tasks(&self, worker_id: &str, max_count: usize) -> Vec<TeamTask> {
        let mut core = self.core.lock();
        let claimed = core.graph.claim_ready_tasks_for(worker_id, max_count);
        if claimed.is_empty() {
            return claimed;
        }

        core.mirror_graph();
        if let Some(first) = claimed.first() {
            core.tracker
                .upsert_heartbeat(Heartbeat::busy(worker_id, first.id.clone()));
        }
        let task_ids: Vec<&str> = claimed.iter().map(|t| t.id.as_str()).collect();
        let version = core.graph.version();
        core.record(
            "tasks_claimed",
            SOURCE_SCHEDULER,
            json!({ "worker_id": worker_id, "task_ids": task_ids, "graph_version": version }),
        );
        claimed
    }

    pub fn submit_result(&self, task_id: &str, result: impl Into<String>) -> Result<()> {
        let mut core = self.core.lock();
        core.graph.submit_result(task_id, result)?;
        core.mirror_graph();
        core.record(
            "task_submitted",
            SOURCE_SCHEDULER,
            json!({ "task_id": task_id }),
        );
        Ok(())
    }

    pub fn complete_task(&self, task_id: &str) -> Result<TeamTask> {
        let mut core = self.core.lock();
        let completed = core.graph.complete_task(task_id)?;
        core.mirror_graph();
        core.record(
            "task_resolved",
            SOURCE_SCHEDULER,
            json!({ "task_id": task_id, "status": completed.status.as_str() }),
        );
        Ok(completed)
    }

    pub fn reject_task(&self, task_id: &str, reason: &str) -> Result<()> {
        let mut core = self.core.lock();
        core.graph.reject_task(task_id, reason)?;
        core.mirror_graph();
        core.record(
            "task_rejected",
            SOURCE_SCHEDULER,
            json!({ "task_id": task_id, "reason": reason }),
        );
        Ok(())
    }

    pub fn requeue_task(&self, task_id: &str) -> Result<()> {
        let mut core = self.core.lock();
        core.graph.requeue_task(task_id)?;
        core.mirror_graph();
        core.record(
            "task_requeued",
            SOURCE_SCHEDULER,
            json!({ "task_id": task_id }),
        );
        Ok(())
    }

    pub fn record_heartbeat(&self, heartbeat: Heartbeat) {
        let mut core = self.core.lock();
        let payload = json!({
            "worker_id": heartbeat.worker_id,
            "task_id": heartbeat.task_id,
            "attempt": heartbeat.attempt,
        });
        core.tracker.upsert_heartbeat(heartbeat);
        core.record("worker_heartbeat", SOURCE_TEAM, payload);
    }

    /// Drives the run-phase machine; a rejected transition leaves the phase
    /// and the event log untouched. Abandoning a run is a transition to
    /// `failed` — there is no separate cancellation primitive.
    pub fn transition_phase(&self, next: RuntimePhase) -> Result<RuntimePhase> {
        let mut core = self.core.lock();
        let from = core.machine.current();
        core.machine.transition_to(next)?;
        core.tracker.set_phase(next);
        core.record(
            "phase_changed",
            SOURCE_ORCHESTRATOR,
            json!({ "from": from.as_str(), "to": next.as_str() }),
        );
        Ok(next)
    }

    pub fn current_phase(&self) -> RuntimePhase {
        self.core.lock().machine.current()
    }

    /// Tasks submitted but not yet completed or rejected.
    pub fn awaiting_review(&self) -> Vec<TeamTask> {
        self.core
            .lock()
            .graph
            .awaiting_review()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> TeamState {
        self.core.lock().tracker.snapshot()
    }

    /// Bounded view of the run's history; the full state is copied out under
    /// the lock and reduced outside it.
    pub fn retained_view(&self, retain_last_events: i64) -> Result<RetentionResult> {
        let state = self.snapshot();
        apply_retention_policy(&state, retain_last_events)
    }

    /// Builds the recovery document from current state. Cheap and
    /// synchronous; persist it with a `CheckpointStore` after this returns
    /// so the mutation lock is never held across disk I/O.
    pub fn checkpoint(&self, policy_profile: &str) -> Checkpoint {
        let core = self.core.lock();
        let done_count = core
            .graph
            .tasks()
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        let checkpoint_id = format!(
            "{}_ckpt-{:03}",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            done_count
        );

        Checkpoint::new(CheckpointFields {
            checkpoint_id,
            phase: core.machine.current(),
            goal: core.tracker.goal().to_string(),
            policy_profile: policy_profile.to_string(),
            pending_tasks: core.graph.pending_task_ids(),
            metadata: Default::default(),
        })
    }
}
