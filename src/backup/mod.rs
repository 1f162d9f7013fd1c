//! goalpost Backup Merge
//!
//! Reads, validates, compares and merges goal-tracking backup snapshots:
//!
//! - **types**: Snapshot data model (BackupSnapshot, GoalSnapshot, QuestionSnapshot, DataPointSnapshot)
//! - **io**: JSON read/write with atomic replace
//! - **validate**: Structural checks (unique ids, question references)
//! - **conflict**: Conflict detection between two snapshots
//! - **report**: Conflict report with per-conflict recommendations
//! - **merge**: Merge resolver and strategies
//! - **error**: Error types
//!
//! # Pipeline
//!
//! ```text
//!   primary ──┐
//!             ├─ validate ─ detect_conflicts ─┬─ StopOnConflict  → ConflictReport
//!   secondary ┘                               └─ SkipConflicting → BackupSnapshot + MergeStats
//! ```
//!
//! # Example
//!
//! ```rust
//! use goalpost::backup::*;
//!
//! let question = QuestionSnapshot::new("How many pages?", ResponseType::Numeric);
//! let goal = GoalSnapshot::new("Read", GoalCategory::Learning).question(question);
//!
//! let primary = BackupSnapshot::new(vec![goal.clone()]);
//! let mut renamed = goal;
//! renamed.title = "Read more".to_string();
//! let secondary = BackupSnapshot::new(vec![renamed]);
//!
//! let outcome = merge(&primary, &secondary, MergeStrategy::StopOnConflict).unwrap();
//! let report = outcome.into_result().unwrap_err();
//! assert_eq!(report.count(EntityKind::Goal), 1);
//! ```

pub mod conflict;
pub mod error;
pub mod io;
pub mod merge;
pub mod report;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use conflict::{
    detect_conflicts, Conflict, DataPointCollisionConflict, DataPointValues, GoalMetadata,
    GoalMetadataConflict, MisplacedEntityConflict, QuestionDefinition, QuestionDivergenceConflict,
};
pub use error::{BackupError, BackupResult, EntityKind, MalformedSnapshotError, SnapshotSide};
pub use io::{read_snapshot, write_snapshot};
pub use merge::{merge, MergeOutcome, MergeStats, MergeStrategy, MergedSnapshot};
pub use report::{recommend, ConflictReport, ReportedConflict};
pub use types::{
    BackupSnapshot, DataPointSnapshot, Frequency, GoalCategory, GoalSnapshot, QuestionSnapshot,
    ResponseType, Schedule, ValidationRules, SNAPSHOT_FORMAT_VERSION,
};
pub use validate::validate_snapshot;
