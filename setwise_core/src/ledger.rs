//! Append-only record of completed sets.

use crate::CompletionStep;

#[derive(Clone, Debug, Default)]
pub struct CompletionLedger {
    steps: Vec<CompletionStep>,
    total_sets: u32,
}

impl CompletionLedger {
    /// Empty ledger for a workout with `total_sets` target sets
    pub fn new(total_sets: u32) -> Self {
        Self {
            steps: Vec::new(),
            total_sets,
        }
    }

    pub fn contains(&self, exercise_index: usize, set_number: u32) -> bool {
        self.steps
            .iter()
            .any(|s| s.exercise_index == exercise_index && s.set_number == set_number)
    }

    /// Append a step. Returns false, leaving the ledger untouched, when the
    /// (exercise, set) pair is already recorded.
    pub fn record(&mut self, step: CompletionStep) -> bool {
        if self.contains(step.exercise_index, step.set_number) {
            tracing::debug!(
                "Set {} of {} already recorded, ignoring",
                step.set_number,
                step.exercise_id
            );
            return false;
        }
        self.steps.push(step);
        true
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    /// Fraction of target sets completed, clamped to [0, 1]
    pub fn progress(&self) -> f64 {
        if self.total_sets == 0 {
            return 0.0;
        }
        (self.steps.len() as f64 / self.total_sets as f64).min(1.0)
    }

    pub fn steps(&self) -> &[CompletionStep] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn step(exercise_index: usize, exercise_id: &str, set_number: u32) -> CompletionStep {
        CompletionStep {
            exercise_index,
            exercise_id: exercise_id.into(),
            set_number,
            started_at: Utc::now(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut ledger = CompletionLedger::new(3);
        assert!(ledger.record(step(0, "squat", 1)));
        assert!(!ledger.record(step(0, "squat", 1)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_progress() {
        let mut ledger = CompletionLedger::new(4);
        assert_eq!(ledger.progress(), 0.0);

        ledger.record(step(0, "squat", 1));
        ledger.record(step(0, "squat", 2));
        ledger.record(step(1, "row", 1));
        assert_eq!(ledger.progress(), 0.75);

        ledger.record(step(1, "row", 2));
        assert_eq!(ledger.progress(), 1.0);
    }

    #[test]
    fn test_repeated_exercise_counts_per_position() {
        let mut ledger = CompletionLedger::new(3);
        assert!(ledger.record(step(0, "squat", 1)));
        assert!(ledger.record(step(1, "row", 1)));
        assert!(ledger.record(step(2, "squat", 1)));
        assert_eq!(ledger.progress(), 1.0);
        assert!(ledger.contains(2, 1));
    }

    #[test]
    fn test_empty_workout_progress_is_zero() {
        let ledger = CompletionLedger::new(0);
        assert_eq!(ledger.progress(), 0.0);
        assert!(ledger.is_empty());
    }
}
