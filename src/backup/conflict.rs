//! Conflict Detector
//!
//! Compares two snapshots entity by entity (matched by id) and reports
//! where the same goal, question or data point has diverged. Entities that
//! exist on one side only are never conflicts.
//!
//! ```text
//! goal matched?      → title / description / isActive differ → GoalMetadata
//!   question matched? → text / responseType differ          → QuestionDivergence
//!   data point matched? → any value field differs           → DataPointCollision
//! question / data point id under different goals per side   → MisplacedEntity
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::error::EntityKind;
use super::types::{BackupSnapshot, DataPointSnapshot, GoalSnapshot, QuestionSnapshot, ResponseType};

/// Goal fields compared for metadata conflicts, plus `updated_at` for context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetadata {
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl GoalMetadata {
    pub fn of(goal: &GoalSnapshot) -> Self {
        Self {
            title: goal.title.clone(),
            description: goal.description.clone(),
            is_active: goal.is_active,
            updated_at: goal.updated_at,
        }
    }

    /// True if any compared field differs (`updated_at` is not compared)
    pub fn diverges_from(&self, other: &GoalMetadata) -> bool {
        self.title != other.title
            || self.description != other.description
            || self.is_active != other.is_active
    }
}

/// Question fields compared for divergence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    pub text: String,
    pub response_type: ResponseType,
}

impl QuestionDefinition {
    pub fn of(question: &QuestionSnapshot) -> Self {
        Self {
            text: question.text.clone(),
            response_type: question.response_type,
        }
    }
}

/// Data point value fields compared for collisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_value: Option<DateTime<Utc>>,
}

impl DataPointValues {
    pub fn of(point: &DataPointSnapshot) -> Self {
        Self {
            numeric_value: point.numeric_value,
            text_value: point.text_value.clone(),
            bool_value: point.bool_value,
            selected_options: point.selected_options.clone(),
            time_value: point.time_value,
        }
    }
}

/// Same goal, different title/description/active flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetadataConflict {
    pub goal_id: Uuid,
    pub primary: GoalMetadata,
    pub secondary: GoalMetadata,
}

/// Same question, different text or response type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDivergenceConflict {
    pub goal_id: Uuid,
    pub question_id: Uuid,
    pub primary: QuestionDefinition,
    pub secondary: QuestionDefinition,
}

/// Same data point, different recorded values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointCollisionConflict {
    pub goal_id: Uuid,
    pub data_point_id: Uuid,
    pub question_id: Uuid,
    pub primary: DataPointValues,
    pub secondary: DataPointValues,
}

/// Same question or data point id filed under a different goal on each side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MisplacedEntityConflict {
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub primary_goal_id: Uuid,
    pub secondary_goal_id: Uuid,
}

/// A divergence between the two versions of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Conflict {
    GoalMetadata(GoalMetadataConflict),
    QuestionDivergence(QuestionDivergenceConflict),
    DataPointCollision(DataPointCollisionConflict),
    MisplacedEntity(MisplacedEntityConflict),
}

impl Conflict {
    /// Id of the conflicting entity
    pub fn entity_id(&self) -> Uuid {
        match self {
            Conflict::GoalMetadata(c) => c.goal_id,
            Conflict::QuestionDivergence(c) => c.question_id,
            Conflict::DataPointCollision(c) => c.data_point_id,
            Conflict::MisplacedEntity(c) => c.entity_id,
        }
    }

    /// Id of the goal the conflicting entity belongs to (primary side)
    pub fn goal_id(&self) -> Uuid {
        match self {
            Conflict::GoalMetadata(c) => c.goal_id,
            Conflict::QuestionDivergence(c) => c.goal_id,
            Conflict::DataPointCollision(c) => c.goal_id,
            Conflict::MisplacedEntity(c) => c.primary_goal_id,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Conflict::GoalMetadata(_) => EntityKind::Goal,
            Conflict::QuestionDivergence(_) => EntityKind::Question,
            Conflict::DataPointCollision(_) => EntityKind::DataPoint,
            Conflict::MisplacedEntity(c) => c.entity_kind,
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::GoalMetadata(c) => write!(
                f,
                "goal {}: \"{}\" vs \"{}\"",
                c.goal_id, c.primary.title, c.secondary.title
            ),
            Conflict::QuestionDivergence(c) => write!(
                f,
                "question {}: \"{}\" ({}) vs \"{}\" ({})",
                c.question_id,
                c.primary.text,
                c.primary.response_type,
                c.secondary.text,
                c.secondary.response_type
            ),
            Conflict::DataPointCollision(c) => {
                write!(f, "data point {}: values differ", c.data_point_id)
            }
            Conflict::MisplacedEntity(c) => write!(
                f,
                "{} {}: under goal {} vs goal {}",
                c.entity_kind, c.entity_id, c.primary_goal_id, c.secondary_goal_id
            ),
        }
    }
}

/// Find every conflict between two snapshots
///
/// Goals, questions and data points are matched by id. Question and data
/// point values are compared within goals present on both sides; an id
/// that sits under different goals on each side is a `MisplacedEntity`.
/// Output order follows the primary snapshot.
pub fn detect_conflicts(primary: &BackupSnapshot, secondary: &BackupSnapshot) -> Vec<Conflict> {
    let secondary_goals: HashMap<Uuid, &GoalSnapshot> =
        secondary.goals.iter().map(|g| (g.id, g)).collect();

    let mut conflicts = Vec::new();

    for goal in &primary.goals {
        let Some(other) = secondary_goals.get(&goal.id) else {
            continue;
        };
        detect_goal_conflicts(goal, other, &mut conflicts);
    }

    detect_misplaced(primary, secondary, &mut conflicts);

    tracing::debug!(count = conflicts.len(), "Conflict detection finished");
    conflicts
}

/// Snapshot-wide owner lookup: child id to the id of the goal holding it
fn owners(snapshot: &BackupSnapshot) -> HashMap<Uuid, Uuid> {
    let mut owners = HashMap::new();
    for goal in &snapshot.goals {
        owners.extend(goal.questions.iter().map(|q| (q.id, goal.id)));
        owners.extend(goal.data_points.iter().map(|p| (p.id, goal.id)));
    }
    owners
}

fn detect_misplaced(
    primary: &BackupSnapshot,
    secondary: &BackupSnapshot,
    conflicts: &mut Vec<Conflict>,
) {
    let secondary_owners = owners(secondary);

    for goal in &primary.goals {
        let children = goal
            .questions
            .iter()
            .map(|q| (EntityKind::Question, q.id))
            .chain(goal.data_points.iter().map(|p| (EntityKind::DataPoint, p.id)));

        for (entity_kind, entity_id) in children {
            let Some(&secondary_goal_id) = secondary_owners.get(&entity_id) else {
                continue;
            };
            if secondary_goal_id == goal.id {
                continue;
            }
            tracing::debug!(%entity_id, %entity_kind, "Entity filed under different goals");
            conflicts.push(Conflict::MisplacedEntity(MisplacedEntityConflict {
                entity_kind,
                entity_id,
                primary_goal_id: goal.id,
                secondary_goal_id,
            }));
        }
    }
}

fn detect_goal_conflicts(
    primary: &GoalSnapshot,
    secondary: &GoalSnapshot,
    conflicts: &mut Vec<Conflict>,
) {
    let primary_meta = GoalMetadata::of(primary);
    let secondary_meta = GoalMetadata::of(secondary);
    if primary_meta.diverges_from(&secondary_meta) {
        tracing::debug!(goal_id = %primary.id, "Goal metadata conflict");
        conflicts.push(Conflict::GoalMetadata(GoalMetadataConflict {
            goal_id: primary.id,
            primary: primary_meta,
            secondary: secondary_meta,
        }));
    }

    let secondary_questions: HashMap<Uuid, &QuestionSnapshot> =
        secondary.questions.iter().map(|q| (q.id, q)).collect();
    for question in &primary.questions {
        let Some(other) = secondary_questions.get(&question.id) else {
            continue;
        };
        let (ours, theirs) = (QuestionDefinition::of(question), QuestionDefinition::of(other));
        if ours != theirs {
            tracing::debug!(question_id = %question.id, "Question divergence");
            conflicts.push(Conflict::QuestionDivergence(QuestionDivergenceConflict {
                goal_id: primary.id,
                question_id: question.id,
                primary: ours,
                secondary: theirs,
            }));
        }
    }

    let secondary_points: HashMap<Uuid, &DataPointSnapshot> =
        secondary.data_points.iter().map(|p| (p.id, p)).collect();
    for point in &primary.data_points {
        let Some(other) = secondary_points.get(&point.id) else {
            continue;
        };
        let (ours, theirs) = (DataPointValues::of(point), DataPointValues::of(other));
        if ours != theirs {
            tracing::debug!(data_point_id = %point.id, "Data point collision");
            conflicts.push(Conflict::DataPointCollision(DataPointCollisionConflict {
                goal_id: primary.id,
                data_point_id: point.id,
                question_id: point.question_id,
                primary: ours,
                secondary: theirs,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::types::*;
    use chrono::{Duration, TimeZone};

    fn base_goal() -> GoalSnapshot {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let question = QuestionSnapshot::new("Hours slept", ResponseType::Numeric);
        GoalSnapshot::new("Sleep", GoalCategory::Health)
            .timestamps(ts, ts)
            .data_point(DataPointSnapshot::numeric(question.id, ts, 7.5))
            .question(question)
    }

    #[test]
    fn test_identical_snapshots_have_no_conflicts() {
        let snapshot = BackupSnapshot::new(vec![base_goal(), base_goal()]);
        assert!(detect_conflicts(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn test_title_change_is_one_goal_conflict() {
        let goal = base_goal();
        let mut renamed = goal.clone();
        renamed.title = "Sleep well".to_string();
        renamed.description = "More hours".to_string();
        renamed.is_active = false;

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal.clone()]),
            &BackupSnapshot::new(vec![renamed]),
        );

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entity_kind(), EntityKind::Goal);
        assert_eq!(conflicts[0].entity_id(), goal.id);
        match &conflicts[0] {
            Conflict::GoalMetadata(c) => {
                assert_eq!(c.primary.title, "Sleep");
                assert_eq!(c.secondary.title, "Sleep well");
                assert!(!c.secondary.is_active);
            }
            other => panic!("unexpected conflict: {:?}", other),
        }
    }

    #[test]
    fn test_updated_at_alone_is_not_a_conflict() {
        let goal = base_goal();
        let mut touched = goal.clone();
        touched.updated_at = touched.updated_at + Duration::days(3);
        touched.custom_category_label = Some("Rest".to_string());

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal]),
            &BackupSnapshot::new(vec![touched]),
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_question_divergence() {
        let goal = base_goal();
        let mut changed = goal.clone();
        changed.questions[0].response_type = ResponseType::Slider;

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal.clone()]),
            &BackupSnapshot::new(vec![changed]),
        );

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entity_id(), goal.questions[0].id);
        assert_eq!(conflicts[0].goal_id(), goal.id);
    }

    #[test]
    fn test_question_options_do_not_conflict() {
        let goal = base_goal();
        let mut changed = goal.clone();
        changed.questions[0].is_active = false;
        changed.questions[0].validation_rules = Some(ValidationRules::default());

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal]),
            &BackupSnapshot::new(vec![changed]),
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_data_point_collision() {
        let goal = base_goal();
        let mut changed = goal.clone();
        changed.data_points[0].numeric_value = Some(6.0);

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal.clone()]),
            &BackupSnapshot::new(vec![changed]),
        );

        assert_eq!(conflicts.len(), 1);
        match &conflicts[0] {
            Conflict::DataPointCollision(c) => {
                assert_eq!(c.data_point_id, goal.data_points[0].id);
                assert_eq!(c.primary.numeric_value, Some(7.5));
                assert_eq!(c.secondary.numeric_value, Some(6.0));
            }
            other => panic!("unexpected conflict: {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_entities_are_not_conflicts() {
        let goal = base_goal();
        let mut extended = goal.clone();
        let extra = QuestionSnapshot::new("Naps", ResponseType::Boolean);
        extended
            .data_points
            .push(DataPointSnapshot::boolean(extra.id, Utc::now(), true));
        extended.questions.push(extra);

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal, base_goal()]),
            &BackupSnapshot::new(vec![extended, base_goal()]),
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_child_under_other_goal_is_misplaced() {
        let goal = base_goal();
        let mut moved = GoalSnapshot::new("Rest", GoalCategory::Health);
        moved.questions = goal.questions.clone();
        moved.data_points = goal.data_points.clone();

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal.clone()]),
            &BackupSnapshot::new(vec![moved.clone()]),
        );

        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].entity_kind(), EntityKind::Question);
        assert_eq!(conflicts[0].entity_id(), goal.questions[0].id);
        assert_eq!(conflicts[1].entity_kind(), EntityKind::DataPoint);
        match &conflicts[1] {
            Conflict::MisplacedEntity(c) => {
                assert_eq!(c.primary_goal_id, goal.id);
                assert_eq!(c.secondary_goal_id, moved.id);
            }
            other => panic!("unexpected conflict: {:?}", other),
        }
    }

    #[test]
    fn test_conflict_json_is_tagged() {
        let goal = base_goal();
        let mut renamed = goal.clone();
        renamed.title = "Rest".to_string();

        let conflicts = detect_conflicts(
            &BackupSnapshot::new(vec![goal]),
            &BackupSnapshot::new(vec![renamed]),
        );
        let json = serde_json::to_value(&conflicts[0]).unwrap();

        assert_eq!(json["kind"], "goalMetadata");
        assert_eq!(json["primary"]["title"], "Sleep");
        assert_eq!(json["secondary"]["title"], "Rest");

        let restored: Conflict = serde_json::from_value(json).unwrap();
        assert_eq!(restored, conflicts[0]);
    }
}
