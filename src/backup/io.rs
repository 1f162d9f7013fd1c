//! Snapshot files
//!
//! Reads and writes the JSON interchange format. Export followed by import
//! reproduces the snapshot field for field.

use std::path::Path;

use super::error::BackupResult;
use super::types::BackupSnapshot;

impl BackupSnapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> BackupResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> BackupResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load a snapshot file
pub fn read_snapshot(path: &Path) -> BackupResult<BackupSnapshot> {
    let content = std::fs::read_to_string(path)?;
    let snapshot = BackupSnapshot::from_json(&content)?;

    tracing::debug!(
        path = %path.display(),
        goals = snapshot.goals.len(),
        questions = snapshot.question_count(),
        data_points = snapshot.data_point_count(),
        "Loaded snapshot"
    );

    Ok(snapshot)
}

/// Write a snapshot file, creating parent directories as needed
///
/// The file is written next to its destination first and renamed into
/// place, so a failed write never leaves a truncated backup behind.
pub fn write_snapshot(path: &Path, snapshot: &BackupSnapshot) -> BackupResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = snapshot.to_json_pretty()?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;

    tracing::debug!(path = %path.display(), goals = snapshot.goals.len(), "Wrote snapshot");
    Ok(())
}
