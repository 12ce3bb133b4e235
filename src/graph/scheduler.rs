use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use super::{TaskStatus, TeamTask};
use crate::error::{Result, TeamRunError};

/// Dependency-aware task scheduler for a single run.
///
/// Owns the lifecycle of every task in the run and a monotonic version
/// counter. Each mutating operation bumps the version exactly once, so
/// consumers can use it as an etag for staleness checks. Rejected operations
/// leave both the tasks and the version untouched.
pub struct TaskGraph {
    tasks: Vec<TeamTask>,
    version: u64,
}

impl TaskGraph {
    /// Builds a graph from an ordered task list. Duplicate ids are a
    /// construction error.
    pub fn new(tasks: Vec<TeamTask>) -> Result<Self> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(TeamRunError::DuplicateTaskId(task.id.clone()));
            }
        }
        Ok(Self { tasks, version: 0 })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tasks(&self) -> &[TeamTask] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&TeamTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Ids of every task not yet `done`, in original order. This is the
    /// pending-task set a recovery checkpoint carries.
    pub fn pending_task_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Claims up to `max_count` ready tasks in original order, moving each to
    /// `in_progress`. A task is ready iff it is `pending` and every id in its
    /// `blocked_by` set resolves to a `done` task. Returns the claimed batch,
    /// possibly empty. The version bumps once per call that claims at least
    /// one task; an empty claim leaves it unchanged.
    pub fn claim_ready_tasks(&mut self, max_count: usize) -> Vec<TeamTask> {
        self.claim_inner(None, max_count)
    }

    /// Same as [`claim_ready_tasks`](Self::claim_ready_tasks), stamping
    /// `assigned_to` on each claimed task as part of the same claim.
    pub fn claim_ready_tasks_for(&mut self, worker_id: &str, max_count: usize) -> Vec<TeamTask> {
        self.claim_inner(Some(worker_id), max_count)
    }

    fn claim_inner(&mut self, assignee: Option<&str>, max_count: usize) -> Vec<TeamTask> {
        let done: HashSet<&str> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .map(|t| t.id.as_str())
            .collect();

        let ready: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.status == TaskStatus::Pending
                    && t.blocked_by.iter().all(|dep| done.contains(dep.as_str()))
            })
            .map(|(i, _)| i)
            .take(max_count)
            .collect();

        if ready.is_empty() {
            return Vec::new();
        }

        let mut claimed = Vec::with_capacity(ready.len());
        for i in ready {
            let task = &mut self.tasks[i];
            task.status = TaskStatus::InProgress;
            if let Some(worker_id) = assignee {
                task.assigned_to = Some(worker_id.to_string());
            }
            claimed.push(task.clone());
        }

        self.version += 1;
        debug!(
            count = claimed.len(),
            version = self.version,
            "Claimed ready tasks"
        );
        claimed
    }

    /// Records a worker's output on an `in_progress` task. Submission does
    /// not auto-complete; a reviewer must still call `complete_task` or
    /// `reject_task`. Re-submission overwrites the prior result.
    pub fn submit_result(&mut self, task_id: &str, result: impl Into<String>) -> Result<()> {
        let task = Self::find_mut(&mut self.tasks, task_id)?;
        Self::require_in_progress(task)?;

        task.result = Some(result.into());
        self.version += 1;
        debug!(task_id, version = self.version, "Result submitted");
        Ok(())
    }

    /// Marks a submitted task `done`, stamping `completed_at` and preserving
    /// its result. Any dependent whose `blocked_by` now fully resolves to
    /// `done` becomes claimable on the next claim call.
    pub fn complete_task(&mut self, task_id: &str) -> Result<TeamTask> {
        let task = Self::find_mut(&mut self.tasks, task_id)?;
        Self::require_in_progress(task)?;
        if task.result.is_none() {
            return Err(TeamRunError::TaskMissingResult(task.id.clone()));
        }

        task.status = TaskStatus::Done;
        task.completed_at = Some(Utc::now());
        task.error = None;
        let completed = task.clone();

        self.version += 1;
        info!(task_id, version = self.version, "Task completed");
        Ok(completed)
    }

    /// Defers an `in_progress` task with a rejection reason, discarding any
    /// submitted result. Deferred tasks are never auto-reclaimed; a
    /// `requeue_task` call is required to make them claimable again.
    pub fn reject_task(&mut self, task_id: &str, reason: impl Into<String>) -> Result<()> {
        let task = Self::find_mut(&mut self.tasks, task_id)?;
        Self::require_in_progress(task)?;

        task.status = TaskStatus::Deferred;
        task.error = Some(reason.into());
        task.result = None;
        task.completed_at = None;

        self.version += 1;
        info!(task_id, version = self.version, "Task rejected");
        Ok(())
    }

    /// Returns a `deferred` task to a claimable `pending` state, clearing
    /// its error, result and assignee.
    pub fn requeue_task(&mut self, task_id: &str) -> Result<()> {
        let task = Self::find_mut(&mut self.tasks, task_id)?;
        if task.status != TaskStatus::Deferred {
            return Err(TeamRunError::TaskNotDeferred {
                task_id: task.id.clone(),
                status: task.status.to_string(),
            });
        }

        task.status = TaskStatus::Pending;
        task.error = None;
        task.result = None;
        task.assigned_to = None;
        task.completed_at = None;

        self.version += 1;
        info!(task_id, version = self.version, "Task requeued");
        Ok(())
    }

    /// Tasks submitted but not yet completed or rejected.
    pub fn awaiting_review(&self) -> Vec<&TeamTask> {
        self.tasks.iter().filter(|t| t.is_awaiting_review()).collect()
    }

    fn find_mut<'a>(tasks: &'a mut [TeamTask], task_id: &str) -> Result<&'a mut TeamTask> {
        tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| TeamRunError::UnknownTask(task_id.to_string()))
    }

    fn require_in_progress(task: &TeamTask) -> Result<()> {
        if task.status != TaskStatus::InProgress {
            return Err(TeamRunError::TaskNotInProgress {
                task_id: task.id.clone(),
                status: task.status.to_string(),
            });
        }
        Ok(())
    }
}
