//! Core domain types for the Setwise session engine.
//!
//! This module defines the fundamental types shared across the crate:
//! - Workouts and their exercises (read-only inputs to a session)
//! - Completion steps and session summaries (outputs of a session)
//! - Identifiers and status values exchanged with collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Workout Types
// ============================================================================

/// How a single set of an exercise is measured
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExerciseTiming {
    /// Max-effort or free-form item with no target
    Untimed,
    /// Rep target, free-form text such as "8-12"
    Reps(String),
    /// Work interval in seconds
    Timed(u32),
    /// Rep target performed inside a work interval
    RepsAndTimed { reps: String, seconds: u32 },
}

impl ExerciseTiming {
    fn from_parts(reps: Option<String>, duration: Option<u32>) -> Self {
        let reps = reps.filter(|r| !r.trim().is_empty());
        let duration = duration.filter(|d| *d > 0);
        match (reps, duration) {
            (Some(reps), Some(seconds)) => ExerciseTiming::RepsAndTimed { reps, seconds },
            (Some(reps), None) => ExerciseTiming::Reps(reps),
            (None, Some(seconds)) => ExerciseTiming::Timed(seconds),
            (None, None) => ExerciseTiming::Untimed,
        }
    }

    /// Work countdown length, if the exercise is timed
    pub fn work_seconds(&self) -> Option<u32> {
        match self {
            ExerciseTiming::Timed(seconds) | ExerciseTiming::RepsAndTimed { seconds, .. } => {
                Some(*seconds)
            }
            _ => None,
        }
    }

    /// Rep target text, if any
    pub fn reps(&self) -> Option<&str> {
        match self {
            ExerciseTiming::Reps(reps) | ExerciseTiming::RepsAndTimed { reps, .. } => Some(reps),
            _ => None,
        }
    }
}

/// On-disk shape of an exercise, every field loose and optional
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ExerciseRecord {
    exercise_id: String,
    #[serde(default)]
    name: Option<String>,
    order: u32,
    #[serde(default)]
    sets: Option<u32>,
    #[serde(default)]
    reps: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    rest_time: Option<u32>,
    #[serde(default)]
    notes: Option<String>,
}

/// One exercise slot in a workout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExerciseRecord", into = "ExerciseRecord")]
pub struct WorkoutExercise {
    pub exercise_id: String,
    pub name: String,
    pub order: u32,
    pub sets: u32,
    pub timing: ExerciseTiming,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl TryFrom<ExerciseRecord> for WorkoutExercise {
    type Error = String;

    fn try_from(record: ExerciseRecord) -> std::result::Result<Self, Self::Error> {
        let sets = record.sets.unwrap_or(1);
        if sets == 0 {
            return Err(format!(
                "exercise '{}' must have at least one set",
                record.exercise_id
            ));
        }

        Ok(WorkoutExercise {
            name: record.name.unwrap_or_else(|| record.exercise_id.clone()),
            exercise_id: record.exercise_id,
            order: record.order,
            sets,
            timing: ExerciseTiming::from_parts(record.reps, record.duration),
            rest_seconds: record.rest_time.filter(|r| *r > 0),
            notes: record.notes,
        })
    }
}

impl From<WorkoutExercise> for ExerciseRecord {
    fn from(exercise: WorkoutExercise) -> Self {
        ExerciseRecord {
            exercise_id: exercise.exercise_id,
            name: Some(exercise.name),
            order: exercise.order,
            sets: Some(exercise.sets),
            reps: exercise.timing.reps().map(str::to_string),
            duration: exercise.timing.work_seconds(),
            rest_time: exercise.rest_seconds,
            notes: exercise.notes,
        }
    }
}

impl WorkoutExercise {
    /// Convenience constructor used by the catalog and tests
    pub fn new(exercise_id: &str, name: &str, order: u32, sets: u32) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            name: name.into(),
            order,
            sets: sets.max(1),
            timing: ExerciseTiming::Untimed,
            rest_seconds: None,
            notes: None,
        }
    }

    pub fn with_timing(mut self, timing: ExerciseTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_seconds = Some(seconds).filter(|s| *s > 0);
        self
    }
}

/// A structured workout, ordered by `WorkoutExercise::order`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub calories_burn: Option<u32>,
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    /// Sum of target sets across every exercise
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }

    /// Validate the workout for use by a session
    ///
    /// Returns a list of validation errors (empty if valid). The session
    /// engine trusts the ordering, so hosts should run this at load time.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.is_empty() {
            errors.push("Workout has empty ID".to_string());
        }
        if self.exercises.is_empty() {
            errors.push(format!("Workout '{}' has no exercises", self.id));
        }

        let mut seen = HashSet::new();
        for (position, exercise) in self.exercises.iter().enumerate() {
            if exercise.exercise_id.is_empty() {
                errors.push(format!("Exercise at position {} has empty ID", position + 1));
            }
            if !seen.insert(exercise.order) {
                errors.push(format!("Duplicate exercise order {}", exercise.order));
            }
            if exercise.order as usize != position + 1 {
                errors.push(format!(
                    "Exercise '{}' has order {} but sits at position {}",
                    exercise.exercise_id,
                    exercise.order,
                    position + 1
                ));
            }
        }

        errors
    }
}

// ============================================================================
// Session Output Types
// ============================================================================

/// Identity of a persisted session record, assigned by the session store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A completed (exercise, set) pair
///
/// `exercise_index` is the exercise's position in the workout, so an
/// exercise repeated in a superset is tracked once per appearance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionStep {
    pub exercise_index: usize,
    pub exercise_id: String,
    pub set_number: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Snapshot taken at the moment a session completes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub workout_id: String,
    pub duration_seconds: u64,
    pub calories_burned: u32,
    pub notes: String,
    pub completed_sets: u32,
    pub total_sets: u32,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Collaborator Vocabulary
// ============================================================================

/// Status values a schedule entry moves through
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleStatus::Scheduled => "SCHEDULED",
            ScheduleStatus::InProgress => "IN_PROGRESS",
            ScheduleStatus::Completed => "COMPLETED",
            ScheduleStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Lifecycle moments the kudos feed can react to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KudosEvent {
    SessionStarted,
    SetCompleted,
    RestStarted,
    ExerciseCompleted,
    SessionCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_defaults_to_one_set() {
        let json = r#"{"exercise_id": "plank", "order": 1, "duration": 45}"#;
        let exercise: WorkoutExercise = serde_json::from_str(json).unwrap();

        assert_eq!(exercise.sets, 1);
        assert_eq!(exercise.name, "plank");
        assert_eq!(exercise.timing, ExerciseTiming::Timed(45));
        assert_eq!(exercise.rest_seconds, None);
    }

    #[test]
    fn test_zero_sets_rejected() {
        let json = r#"{"exercise_id": "squat", "order": 1, "sets": 0}"#;
        let result: std::result::Result<WorkoutExercise, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_reps_and_duration_coexist() {
        let json = r#"{"exercise_id": "burpee", "order": 1, "sets": 3,
                       "reps": "10", "duration": 60, "rest_time": 30}"#;
        let exercise: WorkoutExercise = serde_json::from_str(json).unwrap();

        assert_eq!(exercise.timing.reps(), Some("10"));
        assert_eq!(exercise.timing.work_seconds(), Some(60));
        assert_eq!(exercise.rest_seconds, Some(30));
    }

    #[test]
    fn test_validate_detects_bad_ordering() {
        let workout = Workout {
            id: "w".into(),
            name: "W".into(),
            calories_burn: None,
            exercises: vec![
                WorkoutExercise::new("a", "A", 1, 2),
                WorkoutExercise::new("b", "B", 1, 2),
            ],
        };

        let errors = workout.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate exercise order 1")));
    }

    #[test]
    fn test_validate_empty_workout() {
        let workout = Workout {
            id: "empty".into(),
            name: "Empty".into(),
            calories_burn: None,
            exercises: vec![],
        };
        assert_eq!(workout.validate().len(), 1);
    }

    #[test]
    fn test_total_sets() {
        let workout = Workout {
            id: "w".into(),
            name: "W".into(),
            calories_burn: Some(120),
            exercises: vec![
                WorkoutExercise::new("a", "A", 1, 3),
                WorkoutExercise::new("b", "B", 2, 2),
            ],
        };
        assert_eq!(workout.total_sets(), 5);
    }
}
