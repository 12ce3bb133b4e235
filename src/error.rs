use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamRunError {
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task \"{task_id}\" must be in_progress (currently {status})")]
    TaskNotInProgress { task_id: String, status: String },

    #[error("Cannot complete task \"{0}\" without a submitted result")]
    TaskMissingResult(String),

    #[error("Task \"{task_id}\" must be deferred (currently {status})")]
    TaskNotDeferred { task_id: String, status: String },

    #[error(
        "Invalid runtime phase transition: \"{from}\" -> \"{to}\". Allowed transitions from \"{from}\": {allowed}."
    )]
    InvalidPhaseTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("retain_last_events must be >= 0, got {0}")]
    InvalidRetention(i64),

    #[error("Unsupported checkpoint schema_version: {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("Checkpoint validation failed: {0}")]
    CheckpointValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TeamRunError>;
