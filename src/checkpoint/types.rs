use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TeamRunError};
use crate::phase::RuntimePhase;

pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// Durable recovery document for a run.
///
/// Carries just enough (goal, phase, policy profile, pending task ids) to
/// resume after a crash without replaying the full event log. Lives in its
/// own file with a lifecycle independent of the in-memory state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub schema_version: u32,
    pub checkpoint_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub phase: RuntimePhase,
    pub goal: String,
    pub policy_profile: String,
    #[serde(default)]
    pub pending_tasks: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Caller-supplied fields for a new checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CheckpointFields {
    pub checkpoint_id: String,
    pub phase: RuntimePhase,
    pub goal: String,
    pub policy_profile: String,
    pub pending_tasks: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Checkpoint {
    /// Stamps the schema version and creation timestamps; `updated_at` is
    /// refreshed again on every save.
    pub fn new(fields: CheckpointFields) -> Self {
        let now = Utc::now();
        Self {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            checkpoint_id: fields.checkpoint_id,
            created_at: now,
            updated_at: now,
            phase: fields.phase,
            goal: fields.goal,
            policy_profile: fields.policy_profile,
            pending_tasks: fields.pending_tasks,
            metadata: fields.metadata,
        }
    }
}

/// Leniently deserialized checkpoint document, prior to validation.
///
/// Every field is optional so schema problems surface as validation errors
/// naming the offending field rather than opaque parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCheckpoint {
    pub schema_version: Option<u32>,
    pub checkpoint_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub phase: Option<RuntimePhase>,
    pub goal: Option<String>,
    pub policy_profile: Option<String>,
    #[serde(default)]
    pub pending_tasks: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Enforces the checkpoint schema: recognized `schema_version`, non-empty
/// `checkpoint_id`, `phase` and `goal` present. Must run before any loaded
/// document is merged into live state.
pub fn validate_checkpoint(raw: RawCheckpoint) -> Result<Checkpoint> {
    let schema_version = raw.schema_version.ok_or_else(|| {
        TeamRunError::CheckpointValidation("missing required field: schema_version".to_string())
    })?;
    if schema_version != CHECKPOINT_SCHEMA_VERSION {
        return Err(TeamRunError::UnsupportedSchemaVersion(schema_version));
    }

    let checkpoint_id = match raw.checkpoint_id {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(TeamRunError::CheckpointValidation(
                "checkpoint_id must be a non-empty string".to_string(),
            ));
        }
    };

    let phase = raw.phase.ok_or_else(|| {
        TeamRunError::CheckpointValidation("missing required field: phase".to_string())
    })?;
    let goal = raw.goal.ok_or_else(|| {
        TeamRunError::CheckpointValidation("missing required field: goal".to_string())
    })?;

    let created_at = raw.created_at.unwrap_or_else(Utc::now);
    let updated_at = raw.updated_at.unwrap_or(created_at);

    Ok(Checkpoint {
        schema_version,
        checkpoint_id,
        created_at,
        updated_at,
        phase,
        goal,
        policy_profile: raw.policy_profile.unwrap_or_default(),
        pending_tasks: raw.pending_tasks,
        metadata: raw.metadata,
    })
}
