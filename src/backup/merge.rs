//! Merge Resolver
//!
//! Combines two snapshots into one. Entities are unioned by id; what
//! happens to conflicting entities depends on the strategy:
//!
//! - `StopOnConflict`: any conflict aborts the merge and returns a report
//! - `SkipConflicting`: conflicting entities are dropped from the output,
//!   together with everything that hangs off them
//!
//! # Pipeline
//!
//! ```text
//! validate(primary) → validate(secondary) → detect_conflicts → strategy → union by id
//! ```
//!
//! For a goal present on both sides, scalar fields come from the side with
//! the later `updatedAt` (primary on ties); `createdAt` is the earlier and
//! `updatedAt` the later of the two.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::conflict::{detect_conflicts, Conflict};
use super::error::{BackupResult, EntityKind, SnapshotSide};
use super::report::ConflictReport;
use super::types::{BackupSnapshot, DataPointSnapshot, GoalSnapshot, QuestionSnapshot};
use super::validate::validate_snapshot;

/// What to do when the snapshots disagree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Return a conflict report instead of a merged snapshot
    #[default]
    StopOnConflict,
    /// Leave conflicting entities out and merge the rest
    SkipConflicting,
}

impl MergeStrategy {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "stop" | "stop_on_conflict" => Some(Self::StopOnConflict),
            "skip" | "skip_conflicting" => Some(Self::SkipConflicting),
            _ => None,
        }
    }
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown merge strategy: {}. Use: stop_on_conflict, skip_conflicting",
                s
            )
        })
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StopOnConflict => write!(f, "stop_on_conflict"),
            Self::SkipConflicting => write!(f, "skip_conflicting"),
        }
    }
}

/// Counts describing a completed merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    /// Goals in the merged snapshot
    pub goals: usize,
    /// Questions in the merged snapshot
    pub questions: usize,
    /// Data points in the merged snapshot
    pub data_points: usize,
    /// Conflicting entities left out
    pub conflicts_skipped: usize,
    /// Questions and data points left out because their parent was
    pub cascaded_exclusions: usize,
}

impl std::fmt::Display for MergeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} goals, {} questions, {} data points ({} conflicts skipped, {} dependents dropped)",
            self.goals,
            self.questions,
            self.data_points,
            self.conflicts_skipped,
            self.cascaded_exclusions
        )
    }
}

/// A successful merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSnapshot {
    pub snapshot: BackupSnapshot,
    pub stats: MergeStats,
    /// Conflicts that were excluded (always empty under `StopOnConflict`)
    pub skipped: Vec<Conflict>,
}

/// Result of a merge that passed validation
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged(MergedSnapshot),
    Conflicted(ConflictReport),
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }

    /// The merged snapshot, or the report explaining why there is none
    pub fn into_result(self) -> Result<BackupSnapshot, ConflictReport> {
        match self {
            MergeOutcome::Merged(merged) => Ok(merged.snapshot),
            MergeOutcome::Conflicted(report) => Err(report),
        }
    }
}

/// Ids removed from the union because they conflict
#[derive(Debug, Default)]
struct Exclusions {
    goals: HashSet<Uuid>,
    questions: HashSet<Uuid>,
    data_points: HashSet<Uuid>,
}

impl Exclusions {
    fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let mut exclusions = Self::default();
        for conflict in conflicts {
            let set = match conflict {
                Conflict::GoalMetadata(_) => &mut exclusions.goals,
                Conflict::QuestionDivergence(_) => &mut exclusions.questions,
                Conflict::DataPointCollision(_) => &mut exclusions.data_points,
                Conflict::MisplacedEntity(c) => match c.entity_kind {
                    EntityKind::Goal => &mut exclusions.goals,
                    EntityKind::Question => &mut exclusions.questions,
                    EntityKind::DataPoint => &mut exclusions.data_points,
                },
            };
            set.insert(conflict.entity_id());
        }
        exclusions
    }

    fn is_conflicting_child(&self, id: &Uuid) -> bool {
        self.questions.contains(id) || self.data_points.contains(id)
    }

    fn keeps_question(&self, question: &QuestionSnapshot) -> bool {
        !self.questions.contains(&question.id)
    }

    /// A data point survives only if neither it nor its question is excluded
    fn keeps_data_point(&self, point: &DataPointSnapshot) -> bool {
        !self.data_points.contains(&point.id) && !self.questions.contains(&point.question_id)
    }
}

/// Merge two snapshots
///
/// Both inputs are validated first; a malformed snapshot fails the whole
/// call before any conflict detection runs. Under `StopOnConflict` any
/// conflict yields [`MergeOutcome::Conflicted`].
pub fn merge(
    primary: &BackupSnapshot,
    secondary: &BackupSnapshot,
    strategy: MergeStrategy,
) -> BackupResult<MergeOutcome> {
    for (snapshot, side) in [
        (primary, SnapshotSide::Primary),
        (secondary, SnapshotSide::Secondary),
    ] {
        if let Err(err) = validate_snapshot(snapshot, side) {
            tracing::warn!(error = %err, "Refusing to merge malformed snapshot");
            return Err(err.into());
        }
    }

    let conflicts = detect_conflicts(primary, secondary);

    if !conflicts.is_empty() && strategy == MergeStrategy::StopOnConflict {
        let report = ConflictReport::new(conflicts);
        tracing::info!(%strategy, "Merge stopped: {}", report);
        return Ok(MergeOutcome::Conflicted(report));
    }

    let exclusions = Exclusions::from_conflicts(&conflicts);
    let mut stats = MergeStats {
        conflicts_skipped: conflicts.len(),
        ..MergeStats::default()
    };

    let secondary_goals: HashMap<Uuid, &GoalSnapshot> =
        secondary.goals.iter().map(|g| (g.id, g)).collect();
    let primary_ids: HashSet<Uuid> = primary.goals.iter().map(|g| g.id).collect();

    let mut goals = Vec::with_capacity(primary.goals.len() + secondary.goals.len());

    for goal in &primary.goals {
        let other = secondary_goals.get(&goal.id).copied();

        if exclusions.goals.contains(&goal.id) {
            stats.cascaded_exclusions += dropped_children(goal, other, None, &exclusions);
            continue;
        }

        let merged = match other {
            Some(other) => {
                let merged = merge_goal(goal, other, &exclusions);
                stats.cascaded_exclusions +=
                    dropped_children(goal, Some(other), Some(&merged), &exclusions);
                merged
            }
            None => prune_goal(goal, &exclusions, &mut stats),
        };
        goals.push(merged);
    }

    for goal in secondary.goals.iter().filter(|g| !primary_ids.contains(&g.id)) {
        goals.push(prune_goal(goal, &exclusions, &mut stats));
    }

    stats.goals = goals.len();
    stats.questions = goals.iter().map(|g| g.questions.len()).sum();
    stats.data_points = goals.iter().map(|g| g.data_points.len()).sum();

    let snapshot = BackupSnapshot {
        format_version: primary.format_version.or(secondary.format_version),
        exported_at: primary.exported_at.max(secondary.exported_at),
        goals,
    };

    debug_assert!(
        validate_snapshot(&snapshot, SnapshotSide::Standalone).is_ok(),
        "merge produced a malformed snapshot"
    );
    tracing::info!(%strategy, "Merge complete: {}", stats);

    Ok(MergeOutcome::Merged(MergedSnapshot {
        snapshot,
        stats,
        skipped: conflicts,
    }))
}

/// Merge two versions of the same goal
fn merge_goal(
    primary: &GoalSnapshot,
    secondary: &GoalSnapshot,
    exclusions: &Exclusions,
) -> GoalSnapshot {
    let prefer_secondary = secondary.updated_at > primary.updated_at;
    let winner = if prefer_secondary { secondary } else { primary };

    let questions = union_by_id(
        &primary.questions,
        &secondary.questions,
        prefer_secondary,
        |q| q.id,
        |q| exclusions.keeps_question(q),
    );

    let data_points = union_by_id(
        &primary.data_points,
        &secondary.data_points,
        prefer_secondary,
        |p| p.id,
        |p| exclusions.keeps_data_point(p),
    );

    GoalSnapshot {
        id: primary.id,
        title: winner.title.clone(),
        description: winner.description.clone(),
        category: winner.category,
        custom_category_label: winner.custom_category_label.clone(),
        is_active: winner.is_active,
        schedule: winner.schedule.clone(),
        created_at: primary.created_at.min(secondary.created_at),
        updated_at: primary.updated_at.max(secondary.updated_at),
        questions,
        data_points,
    }
}

/// A goal present on one side only, minus excluded children
fn prune_goal(
    goal: &GoalSnapshot,
    exclusions: &Exclusions,
    stats: &mut MergeStats,
) -> GoalSnapshot {
    let mut pruned = goal.clone();
    pruned.questions.retain(|q| exclusions.keeps_question(q));
    pruned.data_points.retain(|p| exclusions.keeps_data_point(p));
    stats.cascaded_exclusions += dropped_children(goal, None, Some(&pruned), exclusions);
    pruned
}

/// Union two entity lists by id, primary order first
///
/// For ids on both sides the preferred side's version is kept. `keep` is
/// applied to the version that would be emitted.
fn union_by_id<T, I, K>(
    primary: &[T],
    secondary: &[T],
    prefer_secondary: bool,
    id: I,
    keep: K,
) -> Vec<T>
where
    T: Clone,
    I: Fn(&T) -> Uuid,
    K: Fn(&T) -> bool,
{
    let secondary_by_id: HashMap<Uuid, &T> = secondary.iter().map(|x| (id(x), x)).collect();
    let primary_ids: HashSet<Uuid> = primary.iter().map(&id).collect();

    let from_primary = primary.iter().map(|item| match secondary_by_id.get(&id(item)) {
        Some(other) if prefer_secondary => *other,
        _ => item,
    });
    let from_secondary = secondary
        .iter()
        .filter(|item| !primary_ids.contains(&id(*item)));

    from_primary
        .chain(from_secondary)
        .filter(|item| keep(*item))
        .cloned()
        .collect()
}

/// Children of a goal (on either side) that did not make it into the
/// output and are not conflicts themselves
fn dropped_children(
    primary: &GoalSnapshot,
    secondary: Option<&GoalSnapshot>,
    merged: Option<&GoalSnapshot>,
    exclusions: &Exclusions,
) -> usize {
    let sides = std::iter::once(primary).chain(secondary);

    let mut ids: HashSet<Uuid> = HashSet::new();
    for goal in sides {
        ids.extend(goal.questions.iter().map(|q| q.id));
        ids.extend(goal.data_points.iter().map(|p| p.id));
    }

    let kept: HashSet<Uuid> = merged
        .map(|g| {
            g.questions
                .iter()
                .map(|q| q.id)
                .chain(g.data_points.iter().map(|p| p.id))
                .collect()
        })
        .unwrap_or_default();

    ids.iter()
        .filter(|id| !kept.contains(id) && !exclusions.is_conflicting_child(id))
        .count()
}
