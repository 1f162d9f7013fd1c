//! Conflict report
//!
//! The human-facing output of a merge that stopped on conflicts. Each
//! conflict carries an advisory recommendation; nothing acts on it
//! automatically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::conflict::Conflict;
use super::error::{BackupResult, EntityKind};

/// One reported conflict with its advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedConflict {
    pub conflict: Conflict,
    pub recommendation: String,
}

/// Conflicts found between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: Vec<ReportedConflict>,
    pub generated_at: DateTime<Utc>,
}

impl ConflictReport {
    /// Build a report, attaching a recommendation to each conflict
    pub fn new(conflicts: Vec<Conflict>) -> Self {
        Self::with_timestamp(conflicts, Utc::now())
    }

    /// Build a report with an explicit generation time
    pub fn with_timestamp(conflicts: Vec<Conflict>, generated_at: DateTime<Utc>) -> Self {
        let conflicts = conflicts
            .into_iter()
            .map(|conflict| ReportedConflict {
                recommendation: recommend(&conflict),
                conflict,
            })
            .collect();

        Self {
            conflicts,
            generated_at,
        }
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts for one entity class
    pub fn count(&self, kind: EntityKind) -> usize {
        self.conflicts
            .iter()
            .filter(|c| c.conflict.entity_kind() == kind)
            .count()
    }

    pub fn to_json_pretty(&self) -> BackupResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON
    pub fn write_to(&self, path: &Path) -> BackupResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} conflict(s): {} goal, {} question, {} data point",
            self.len(),
            self.count(EntityKind::Goal),
            self.count(EntityKind::Question),
            self.count(EntityKind::DataPoint)
        )
    }
}

/// Advisory text for one conflict
pub fn recommend(conflict: &Conflict) -> String {
    match conflict {
        Conflict::GoalMetadata(c) => {
            if c.primary.updated_at == c.secondary.updated_at {
                "Both versions share the same updatedAt; review the goal manually".to_string()
            } else {
                let (side, at) = if c.primary.updated_at > c.secondary.updated_at {
                    ("primary", c.primary.updated_at)
                } else {
                    ("secondary", c.secondary.updated_at)
                };
                format!(
                    "Use most recent updatedAt: keep the {} version (updated {})",
                    side,
                    at.format("%Y-%m-%d %H:%M UTC")
                )
            }
        }
        Conflict::QuestionDivergence(c) => {
            if c.primary.response_type != c.secondary.response_type {
                format!(
                    "Response type changed ({} vs {}); keep the version that matches the logged answers",
                    c.primary.response_type, c.secondary.response_type
                )
            } else {
                "Question wording differs; keep the preferred wording and re-export".to_string()
            }
        }
        Conflict::DataPointCollision(_) => {
            "Same entry holds different values; keep the value from the device that logged it"
                .to_string()
        }
        Conflict::MisplacedEntity(c) => format!(
            "This {} is filed under a different goal on each device; move it back to one goal before merging",
            c.entity_kind
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::conflict::*;
    use crate::backup::types::ResponseType;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn goal_conflict(primary_newer: bool) -> Conflict {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = ts + Duration::days(2);
        let meta = |title: &str, updated_at| GoalMetadata {
            title: title.to_string(),
            description: String::new(),
            is_active: true,
            updated_at,
        };

        Conflict::GoalMetadata(GoalMetadataConflict {
            goal_id: Uuid::new_v4(),
            primary: meta("Run", if primary_newer { later } else { ts }),
            secondary: meta("Jog", if primary_newer { ts } else { later }),
        })
    }

    fn question_conflict() -> Conflict {
        let definition = |response_type| QuestionDefinition {
            text: "Distance".to_string(),
            response_type,
        };
        Conflict::QuestionDivergence(QuestionDivergenceConflict {
            goal_id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            primary: definition(ResponseType::Numeric),
            secondary: definition(ResponseType::Slider),
        })
    }

    #[test]
    fn test_recommendations() {
        assert!(recommend(&goal_conflict(true)).contains("keep the primary version"));
        assert!(recommend(&goal_conflict(false)).contains("keep the secondary version"));
        assert!(recommend(&question_conflict()).contains("numeric vs slider"));

        let misplaced = Conflict::MisplacedEntity(MisplacedEntityConflict {
            entity_kind: EntityKind::DataPoint,
            entity_id: Uuid::new_v4(),
            primary_goal_id: Uuid::new_v4(),
            secondary_goal_id: Uuid::new_v4(),
        });
        assert!(recommend(&misplaced).starts_with("This data point is filed under a different goal"));
    }

    #[test]
    fn test_report_counts() {
        let report = ConflictReport::new(vec![goal_conflict(true), question_conflict()]);

        assert_eq!(report.len(), 2);
        assert_eq!(report.count(EntityKind::Goal), 1);
        assert_eq!(report.count(EntityKind::DataPoint), 0);
        assert_eq!(
            report.to_string(),
            "2 conflict(s): 1 goal, 1 question, 0 data point"
        );
        assert!(report.conflicts.iter().all(|c| !c.recommendation.is_empty()));
    }

    #[test]
    fn test_report_json_shape() {
        let report = ConflictReport::new(vec![goal_conflict(true)]);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert!(json["generatedAt"].is_string());
        assert_eq!(json["conflicts"][0]["conflict"]["kind"], "goalMetadata");
        assert!(json["conflicts"][0]["conflict"]["goalId"].is_string());
        assert!(json["conflicts"][0]["recommendation"].is_string());
    }

    #[test]
    fn test_write_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("conflicts.json");
        let report = ConflictReport::new(vec![question_conflict()]);

        report.write_to(&path).unwrap();

        let restored: ConflictReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, report);
    }
}
