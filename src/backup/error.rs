//! Backup error types
//!
//! Defines all errors that can occur while reading, validating or merging
//! backup snapshots. A merge that finds conflicts is not an error; see
//! [`crate::backup::MergeOutcome`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Which input snapshot an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSide {
    Primary,
    Secondary,
    /// A snapshot checked on its own, outside a merge
    Standalone,
}

impl std::fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSide::Primary => write!(f, "primary"),
            SnapshotSide::Secondary => write!(f, "secondary"),
            SnapshotSide::Standalone => write!(f, "standalone"),
        }
    }
}

/// Entity classes inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Goal,
    Question,
    DataPoint,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Goal => write!(f, "goal"),
            EntityKind::Question => write!(f, "question"),
            EntityKind::DataPoint => write!(f, "data point"),
        }
    }
}

/// Structural problems that make a snapshot unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedSnapshotError {
    /// A data point points at a question its goal does not have
    #[error("{side} snapshot: data point {data_point_id} in goal {goal_id} references missing question {question_id}")]
    DanglingQuestionReference {
        side: SnapshotSide,
        goal_id: Uuid,
        data_point_id: Uuid,
        question_id: Uuid,
    },

    /// The same id appears twice within one entity class
    #[error("{side} snapshot: duplicate {kind} id {id}")]
    DuplicateId {
        side: SnapshotSide,
        kind: EntityKind,
        id: Uuid,
    },
}

impl MalformedSnapshotError {
    pub fn side(&self) -> SnapshotSide {
        match self {
            Self::DanglingQuestionReference { side, .. } | Self::DuplicateId { side, .. } => *side,
        }
    }
}

/// Errors that can occur in the backup layer
#[derive(Error, Debug)]
pub enum BackupError {
    /// Snapshot failed structural validation
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] MalformedSnapshotError),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        let err = MalformedSnapshotError::DuplicateId {
            side: SnapshotSide::Secondary,
            kind: EntityKind::DataPoint,
            id,
        };
        assert_eq!(
            err.to_string(),
            "secondary snapshot: duplicate data point id 00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(err.side(), SnapshotSide::Secondary);
    }

    #[test]
    fn test_malformed_conversion() {
        let err: BackupError = MalformedSnapshotError::DuplicateId {
            side: SnapshotSide::Primary,
            kind: EntityKind::Goal,
            id: Uuid::nil(),
        }
        .into();
        assert!(matches!(err, BackupError::Malformed(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BackupError = json_err.into();
        assert!(matches!(err, BackupError::Serialization(_)));
    }
}
