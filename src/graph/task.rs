use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTask {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,

    /// Ids of tasks that must reach `done` before this task is claimable.
    #[serde(default)]
    pub blocked_by: Vec<String>,

    #[serde(default)]
    pub assigned_to: Option<String>,

    /// A worker's submitted output awaiting review.
    #[serde(default)]
    pub result: Option<String>,

    /// Rejection reason set when the task is deferred.
    #[serde(default)]
    pub error: Option<String>,

    pub completed_at: Option<DateTime<Utc>>,
}

impl TeamTask {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            blocked_by: Vec::new(),
            assigned_to: None,
            result: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn with_blocked_by(mut self, deps: Vec<String>) -> Self {
        self.blocked_by = deps;
        self
    }

    pub fn with_assigned_to(mut self, worker_id: impl Into<String>) -> Self {
        self.assigned_to = Some(worker_id.into());
        self
    }

    /// Submitted but not yet completed or rejected. Recomputed from the two
    /// underlying fields on every call, never cached.
    pub fn is_awaiting_review(&self) -> bool {
        self.status == TaskStatus::InProgress && self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = TeamTask::new("t-1", "Wire up the login form")
            .with_blocked_by(vec!["t-0".to_string()]);

        assert_eq!(task.id, "t-1");
        assert_eq!(task.description, "Wire up the login form");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.blocked_by, vec!["t-0"]);
        assert!(task.result.is_none());
        assert!(task.error.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_awaiting_review_requires_both_fields() {
        let mut task = TeamTask::new("t-1", "Task");
        assert!(!task.is_awaiting_review());

        task.status = TaskStatus::InProgress;
        assert!(!task.is_awaiting_review());

        task.result = Some("output".to_string());
        assert!(task.is_awaiting_review());

        task.status = TaskStatus::Done;
        assert!(!task.is_awaiting_review());
    }
}
