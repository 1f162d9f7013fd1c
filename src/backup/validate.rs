//! Snapshot validation
//!
//! Checks the structural rules every snapshot must satisfy before it can
//! be merged: ids are unique per entity class, and each data point names a
//! question that exists in its own goal.

use std::collections::HashSet;
use uuid::Uuid;

use super::error::{EntityKind, MalformedSnapshotError, SnapshotSide};
use super::types::BackupSnapshot;

/// Validate one snapshot, stopping at the first problem found
pub fn validate_snapshot(
    snapshot: &BackupSnapshot,
    side: SnapshotSide,
) -> Result<(), MalformedSnapshotError> {
    let mut goal_ids: HashSet<Uuid> = HashSet::new();
    let mut question_ids: HashSet<Uuid> = HashSet::new();
    let mut data_point_ids: HashSet<Uuid> = HashSet::new();

    let duplicate = |kind, id| MalformedSnapshotError::DuplicateId { side, kind, id };

    for goal in &snapshot.goals {
        if !goal_ids.insert(goal.id) {
            return Err(duplicate(EntityKind::Goal, goal.id));
        }

        let mut own_questions: HashSet<Uuid> = HashSet::with_capacity(goal.questions.len());
        for question in &goal.questions {
            if !question_ids.insert(question.id) {
                return Err(duplicate(EntityKind::Question, question.id));
            }
            own_questions.insert(question.id);
        }

        for point in &goal.data_points {
            if !own_questions.contains(&point.question_id) {
                return Err(MalformedSnapshotError::DanglingQuestionReference {
                    side,
                    goal_id: goal.id,
                    data_point_id: point.id,
                    question_id: point.question_id,
                });
            }
            if !data_point_ids.insert(point.id) {
                return Err(duplicate(EntityKind::DataPoint, point.id));
            }
        }
    }

    Ok(())
}
