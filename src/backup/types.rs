//! Backup snapshot model
//!
//! The exported JSON tree of goals → questions → data points. Entities are
//! linked by stable UUIDs: a data point names its question through
//! `questionID`, and both live inside the same goal.
//!
//! Field names follow the exchange format (camelCase, ISO-8601 dates).

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::series::{
    boolean_presence, numeric_presence, BooleanResponse, CalendarDay, DayBoundary, RawResponse,
};

/// Current snapshot format version written by this crate
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A complete exported tree of goals
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    pub goals: Vec<GoalSnapshot>,
}

impl BackupSnapshot {
    /// Create a snapshot from a list of goals
    pub fn new(goals: Vec<GoalSnapshot>) -> Self {
        Self {
            format_version: Some(SNAPSHOT_FORMAT_VERSION),
            exported_at: None,
            goals,
        }
    }

    /// Builder: stamp the export time
    pub fn exported_at(mut self, at: DateTime<Utc>) -> Self {
        self.exported_at = Some(at);
        self
    }

    /// Find a goal by id
    pub fn goal(&self, id: Uuid) -> Option<&GoalSnapshot> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.goals.iter().map(|g| g.questions.len()).sum()
    }

    pub fn data_point_count(&self) -> usize {
        self.goals.iter().map(|g| g.data_points.len()).sum()
    }
}

/// Goal category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Health,
    Fitness,
    Productivity,
    Mindfulness,
    Learning,
    Social,
    Finance,
    /// User-defined; see `GoalSnapshot::custom_category_label`
    Custom,
}

impl std::fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalCategory::Health => write!(f, "health"),
            GoalCategory::Fitness => write!(f, "fitness"),
            GoalCategory::Productivity => write!(f, "productivity"),
            GoalCategory::Mindfulness => write!(f, "mindfulness"),
            GoalCategory::Learning => write!(f, "learning"),
            GoalCategory::Social => write!(f, "social"),
            GoalCategory::Finance => write!(f, "finance"),
            GoalCategory::Custom => write!(f, "custom"),
        }
    }
}

/// How often the goal reminds the user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekdays,
    Weekly,
    Custom,
}

/// Reminder schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub frequency: Frequency,
    /// ISO weekday numbers (1 = Monday) for weekly and custom schedules
    #[serde(default)]
    pub weekdays: Vec<u8>,
    /// Local reminder times
    #[serde(default)]
    pub reminder_times: Vec<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_identifier: Option<String>,
}

/// One tracked goal with its questions and logged data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: GoalCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_category_label: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub schedule: Schedule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<QuestionSnapshot>,
    #[serde(default)]
    pub data_points: Vec<DataPointSnapshot>,
}

impl GoalSnapshot {
    /// Create an active goal with a fresh id, created now
    pub fn new(title: impl Into<String>, category: GoalCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            category,
            custom_category_label: None,
            is_active: true,
            schedule: Schedule::default(),
            created_at: now,
            updated_at: now,
            questions: Vec::new(),
            data_points: Vec::new(),
        }
    }

    /// Builder: set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set both timestamps
    pub fn timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Builder: add a question
    pub fn question(mut self, question: QuestionSnapshot) -> Self {
        self.questions.push(question);
        self
    }

    /// Builder: add a data point
    pub fn data_point(mut self, point: DataPointSnapshot) -> Self {
        self.data_points.push(point);
        self
    }

    /// Find a question by id
    pub fn find_question(&self, id: Uuid) -> Option<&QuestionSnapshot> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Data points answering one question
    pub fn points_for(&self, question_id: Uuid) -> impl Iterator<Item = &DataPointSnapshot> {
        self.data_points
            .iter()
            .filter(move |p| p.question_id == question_id)
    }

    /// Numeric answers to one question, ready for aggregation
    ///
    /// Data points without a numeric value are skipped.
    pub fn numeric_responses(&self, question_id: Uuid) -> Vec<RawResponse> {
        self.points_for(question_id)
            .filter(|p| p.numeric_value.is_some())
            .map(|p| RawResponse {
                timestamp: p.timestamp,
                numeric_value: p.numeric_value,
            })
            .collect()
    }

    /// Yes/no answers to one question, ready for streaks
    pub fn boolean_responses(&self, question_id: Uuid) -> Vec<BooleanResponse> {
        self.points_for(question_id)
            .map(|p| BooleanResponse {
                timestamp: p.timestamp,
                bool_value: p.bool_value,
            })
            .collect()
    }

    /// Days that count toward a streak for this question
    ///
    /// Yes/no questions count days with a `true` answer; numeric-family
    /// questions count days with any value. Other response types have no
    /// notion of completion and return `None`.
    pub fn answered_days<B: DayBoundary + ?Sized>(
        &self,
        question: &QuestionSnapshot,
        boundary: &B,
    ) -> Option<HashSet<CalendarDay>> {
        if question.response_type.is_boolean() {
            Some(boolean_presence(&self.boolean_responses(question.id), boundary))
        } else if question.response_type.is_numeric_family() {
            Some(numeric_presence(&self.numeric_responses(question.id), boundary))
        } else {
            None
        }
    }
}

/// Answer kinds a question can collect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    Numeric,
    Boolean,
    Scale,
    Slider,
    MultipleChoice,
    Text,
    Time,
}

impl ResponseType {
    /// Answers that feed the numeric aggregator
    pub fn is_numeric_family(&self) -> bool {
        match self {
            ResponseType::Numeric | ResponseType::Scale | ResponseType::Slider => true,
            ResponseType::Boolean
            | ResponseType::MultipleChoice
            | ResponseType::Text
            | ResponseType::Time => false,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ResponseType::Boolean)
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseType::Numeric => write!(f, "numeric"),
            ResponseType::Boolean => write!(f, "boolean"),
            ResponseType::Scale => write!(f, "scale"),
            ResponseType::Slider => write!(f, "slider"),
            ResponseType::MultipleChoice => write!(f, "multipleChoice"),
            ResponseType::Text => write!(f, "text"),
            ResponseType::Time => write!(f, "time"),
        }
    }
}

/// Input limits for a question
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default)]
    pub allows_empty: bool,
}

/// A prompt attached to a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    pub id: Uuid,
    pub text: String,
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl QuestionSnapshot {
    /// Create an active question with a fresh id
    pub fn new(text: impl Into<String>, response_type: ResponseType) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            response_type,
            options: None,
            validation_rules: None,
            is_active: true,
        }
    }

    /// Builder: set multiple-choice options
    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }

    /// Builder: set a numeric range
    pub fn range(mut self, min: f64, max: f64) -> Self {
        let rules = self.validation_rules.get_or_insert_with(ValidationRules::default);
        rules.minimum_value = Some(min);
        rules.maximum_value = Some(max);
        self
    }
}

/// One logged answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataPointSnapshot {
    pub id: Uuid,
    #[serde(rename = "questionID")]
    pub question_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    /// Increment applied by running-counter questions (e.g. water intake)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_value: Option<DateTime<Utc>>,
}

impl DataPointSnapshot {
    fn blank(question_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            timestamp,
            numeric_value: None,
            numeric_delta: None,
            bool_value: None,
            text_value: None,
            selected_options: None,
            time_value: None,
        }
    }

    /// A numeric answer
    pub fn numeric(question_id: Uuid, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            numeric_value: Some(value),
            ..Self::blank(question_id, timestamp)
        }
    }

    /// A yes/no answer
    pub fn boolean(question_id: Uuid, timestamp: DateTime<Utc>, value: bool) -> Self {
        Self {
            bool_value: Some(value),
            ..Self::blank(question_id, timestamp)
        }
    }

    /// A free-text answer
    pub fn text(question_id: Uuid, timestamp: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            text_value: Some(value.into()),
            ..Self::blank(question_id, timestamp)
        }
    }

    /// Builder: override the generated id
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_goal() -> GoalSnapshot {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        let mood = QuestionSnapshot::new("How is your mood?", ResponseType::Scale).range(1.0, 10.0);
        let walked = QuestionSnapshot::new("Did you walk?", ResponseType::Boolean);

        GoalSnapshot::new("Wellbeing", GoalCategory::Health)
            .timestamps(ts, ts)
            .data_point(DataPointSnapshot::numeric(mood.id, ts, 6.0))
            .data_point(DataPointSnapshot {
                numeric_value: None,
                ..DataPointSnapshot::numeric(mood.id, ts + Duration::days(1), 0.0)
            })
            .data_point(DataPointSnapshot::boolean(walked.id, ts, true))
            .question(mood)
            .question(walked)
    }

    #[test]
    fn test_response_type_families() {
        assert!(ResponseType::Scale.is_numeric_family());
        assert!(ResponseType::Slider.is_numeric_family());
        assert!(!ResponseType::Boolean.is_numeric_family());
        assert!(ResponseType::Boolean.is_boolean());
        assert_eq!(
            serde_json::to_string(&ResponseType::MultipleChoice).unwrap(),
            "\"multipleChoice\""
        );
    }

    #[test]
    fn test_numeric_responses_skip_empty() {
        let goal = sample_goal();
        let mood = goal.questions[0].id;

        let responses = goal.numeric_responses(mood);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].numeric_value, Some(6.0));
    }

    #[test]
    fn test_boolean_responses() {
        let goal = sample_goal();
        let walked = goal.questions[1].id;

        let responses = goal.boolean_responses(walked);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].bool_value, Some(true));
    }

    #[test]
    fn test_answered_days_by_response_type() {
        let mut goal = sample_goal();
        let journal = QuestionSnapshot::new("Journal entry", ResponseType::Text);
        goal.data_points.push(DataPointSnapshot::text(
            journal.id,
            goal.created_at,
            "slept well",
        ));
        goal.questions.push(journal.clone());

        let rules = crate::series::CalendarRules::utc();
        let feb_1 = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let mood_days = goal.answered_days(&goal.questions[0], &rules).unwrap();
        assert_eq!(mood_days.into_iter().collect::<Vec<_>>(), vec![feb_1]);

        let walked_days = goal.answered_days(&goal.questions[1], &rules).unwrap();
        assert!(walked_days.contains(&feb_1));

        assert!(goal.answered_days(&journal, &rules).is_none());
    }

    #[test]
    fn test_data_point_field_names() {
        let goal = sample_goal();
        let json = serde_json::to_value(&goal.data_points[0]).unwrap();

        assert!(json.get("questionID").is_some());
        assert!(json.get("numericValue").is_some());
        assert!(json.get("boolValue").is_none());
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-02-01T08:00:00"));
    }

    #[test]
    fn test_snapshot_counts() {
        let snapshot = BackupSnapshot::new(vec![sample_goal()]);

        assert_eq!(snapshot.question_count(), 2);
        assert_eq!(snapshot.data_point_count(), 3);
        assert!(snapshot.goal(snapshot.goals[0].id).is_some());
        assert!(snapshot.goal(Uuid::new_v4()).is_none());
    }
}
