use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use super::types::{Checkpoint, RawCheckpoint, validate_checkpoint};
use crate::error::{Result, TeamRunError};

/// Deterministic file path for a checkpoint id within a directory. Pure —
/// callers may compute it before the file exists.
pub fn checkpoint_path(checkpoint_id: &str, dir: &Path) -> PathBuf {
    dir.join(format!("{}.yaml", checkpoint_id))
}

/// Persists recovery documents, one YAML file per checkpoint.
///
/// Save and load are the only blocking I/O in the core. Callers should not
/// hold a run's mutation lock across them; build the checkpoint under the
/// lock, release, then persist.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, checkpoint_id: &str) -> PathBuf {
        checkpoint_path(checkpoint_id, &self.dir)
    }

    /// Writes the checkpoint, refreshing `updated_at`, and returns the path
    /// (always equal to what `checkpoint_path` computes for the same inputs).
    /// Write is atomic: serialize to a temp file, then rename.
    pub async fn save(&self, checkpoint: &mut Checkpoint) -> Result<PathBuf> {
        if checkpoint.checkpoint_id.is_empty() {
            return Err(TeamRunError::CheckpointValidation(
                "checkpoint_id must be a non-empty string".to_string(),
            ));
        }

        fs::create_dir_all(&self.dir).await?;

        checkpoint.updated_at = Utc::now();
        let path = self.path_for(&checkpoint.checkpoint_id);
        let tmp_path = path.with_extension("yaml.tmp");

        let yaml = serde_yaml_bw::to_string(checkpoint)?;
        fs::write(&tmp_path, &yaml).await?;
        fs::rename(&tmp_path, &path).await.inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp_path);
        })?;

        info!(
            checkpoint_id = checkpoint.checkpoint_id,
            path = %path.display(),
            "Checkpoint saved"
        );
        Ok(path)
    }

    /// Reads and deserializes a checkpoint file, then runs the same
    /// validation as `validate_checkpoint`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Checkpoint> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let raw: RawCheckpoint = serde_yaml_bw::from_str(&content)?;
        let checkpoint = validate_checkpoint(raw)?;
        debug!(
            checkpoint_id = checkpoint.checkpoint_id,
            path = %path.display(),
            "Checkpoint loaded"
        );
        Ok(checkpoint)
    }

    /// Paths of every checkpoint file in the directory, lexicographically
    /// sorted so a fixed directory state always lists the same way.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "yaml") {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointFields;
    use crate::phase::RuntimePhase;
    use tempfile::TempDir;

    fn sample_checkpoint(id: &str) -> Checkpoint {
        Checkpoint::new(CheckpointFields {
            checkpoint_id: id.to_string(),
            phase: RuntimePhase::Executing,
            goal: "Ship the feature".to_string(),
            policy_profile: "strict".to_string(),
            pending_tasks: vec!["t-2".to_string(), "t-3".to_string()],
            metadata: Default::default(),
        })
    }

    #[test]
    fn test_checkpoint_path_is_pure_and_deterministic() {
        let dir = Path::new("/var/run/team");
        assert_eq!(
            checkpoint_path("ckpt-7", dir),
            PathBuf::from("/var/run/team/ckpt-7.yaml")
        );
        assert_eq!(checkpoint_path("ckpt-7", dir), checkpoint_path("ckpt-7", dir));
    }

    #[tokio::test]
    async fn test_save_returns_computed_path() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("ckpt-1");

        let path = store.save(&mut checkpoint).await.unwrap();
        assert_eq!(path, checkpoint_path("ckpt-1", dir.path()));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("ckpt-1");
        checkpoint
            .metadata
            .insert("attempt".to_string(), serde_json::json!(3));

        let path = store.save(&mut checkpoint).await.unwrap();
        let loaded = CheckpointStore::load(&path).await.unwrap();

        assert_eq!(loaded.checkpoint_id, "ckpt-1");
        assert_eq!(loaded.phase, RuntimePhase::Executing);
        assert_eq!(loaded.goal, "Ship the feature");
        assert_eq!(loaded.policy_profile, "strict");
        assert_eq!(loaded.pending_tasks, vec!["t-2", "t-3"]);
        assert_eq!(loaded.metadata["attempt"], serde_json::json!(3));
        assert_eq!(loaded.created_at, checkpoint.created_at);
    }

    #[tokio::test]
    async fn test_save_refreshes_updated_at() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("ckpt-1");
        let created = checkpoint.created_at;
        let updated = checkpoint.updated_at;

        store.save(&mut checkpoint).await.unwrap();
        assert!(checkpoint.updated_at >= updated);
        assert_eq!(checkpoint.created_at, created);
    }

    #[tokio::test]
    async fn test_save_rejects_empty_id() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("");

        let err = store.save(&mut checkpoint).await.unwrap_err();
        assert!(err.to_string().contains("checkpoint_id"));
    }

    #[tokio::test]
    async fn test_list_single_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("ckpt-1");
        let path = store.save(&mut checkpoint).await.unwrap();

        assert_eq!(store.list_files().await.unwrap(), vec![path]);
    }

    #[tokio::test]
    async fn test_list_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        for id in ["ckpt-b", "ckpt-a", "ckpt-c"] {
            store.save(&mut sample_checkpoint(id)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_files()
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ckpt-a.yaml", "ckpt-b.yaml", "ckpt-c.yaml"]);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("nope"));
        assert!(store.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, ": not: [valid").unwrap();

        let err = CheckpointStore::load(&path).await.unwrap_err();
        assert!(matches!(err, TeamRunError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_schema_version() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut checkpoint = sample_checkpoint("ckpt-1");
        checkpoint.schema_version = 42;

        // Bypass save's stamping by writing the document directly
        let path = store.path_for("ckpt-1");
        std::fs::write(&path, serde_yaml_bw::to_string(&checkpoint).unwrap()).unwrap();

        let err = CheckpointStore::load(&path).await.unwrap_err();
        assert!(matches!(err, TeamRunError::UnsupportedSchemaVersion(42)));
    }
}
