//! Position within a workout's exercise/set grid.

use crate::{Workout, WorkoutExercise};

/// Where the cursor goes after the current set is done
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    NextSet,
    NextExercise,
    /// Past the last set of the last exercise
    Finish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionCursor {
    exercise_index: usize,
    set_number: u32,
}

impl Default for ProgressionCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionCursor {
    pub fn new() -> Self {
        Self {
            exercise_index: 0,
            set_number: 1,
        }
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn set_number(&self) -> u32 {
        self.set_number
    }

    pub fn current<'a>(&self, workout: &'a Workout) -> Option<&'a WorkoutExercise> {
        workout.exercises.get(self.exercise_index)
    }

    pub fn is_last_exercise(&self, workout: &Workout) -> bool {
        self.exercise_index + 1 >= workout.exercises.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.exercise_index > 0
    }

    /// Decide what completing the current set leads to
    pub fn next_step(&self, workout: &Workout) -> Advance {
        let sets = self.current(workout).map(|e| e.sets).unwrap_or(1);
        if self.set_number < sets {
            Advance::NextSet
        } else if self.is_last_exercise(workout) {
            Advance::Finish
        } else {
            Advance::NextExercise
        }
    }

    /// Move to the next set of the current exercise.
    ///
    /// Returns false without moving if that would exceed the target sets.
    pub fn next_set(&mut self, workout: &Workout) -> bool {
        let sets = self.current(workout).map(|e| e.sets).unwrap_or(1);
        if self.set_number < sets {
            self.set_number += 1;
            true
        } else {
            false
        }
    }

    /// Move to set 1 of the next exercise. Returns false on the last one.
    pub fn next_exercise(&mut self, workout: &Workout) -> bool {
        if self.is_last_exercise(workout) {
            return false;
        }
        self.exercise_index += 1;
        self.set_number = 1;
        true
    }

    /// Move to set 1 of the previous exercise. Returns false on the first one.
    pub fn previous_exercise(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.exercise_index -= 1;
        self.set_number = 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout() -> Workout {
        Workout {
            id: "w".into(),
            name: "W".into(),
            calories_burn: None,
            exercises: vec![
                WorkoutExercise::new("a", "A", 1, 2),
                WorkoutExercise::new("b", "B", 2, 1),
            ],
        }
    }

    #[test]
    fn test_walks_the_grid() {
        let workout = workout();
        let mut cursor = ProgressionCursor::new();

        assert_eq!(cursor.next_step(&workout), Advance::NextSet);
        assert!(cursor.next_set(&workout));
        assert_eq!(cursor.set_number(), 2);

        assert_eq!(cursor.next_step(&workout), Advance::NextExercise);
        assert!(!cursor.next_set(&workout));
        assert!(cursor.next_exercise(&workout));
        assert_eq!((cursor.exercise_index(), cursor.set_number()), (1, 1));

        assert_eq!(cursor.next_step(&workout), Advance::Finish);
        assert!(!cursor.next_exercise(&workout));
    }

    #[test]
    fn test_previous_resets_set_number() {
        let workout = workout();
        let mut cursor = ProgressionCursor::new();
        assert!(!cursor.previous_exercise());

        cursor.next_exercise(&workout);
        assert!(cursor.previous_exercise());
        assert_eq!((cursor.exercise_index(), cursor.set_number()), (0, 1));
    }
}
