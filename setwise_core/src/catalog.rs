//! Built-in workouts and workout-file loading.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::path::Path;

/// Cached default catalog - built once and reused
static DEFAULT_CATALOG: Lazy<BTreeMap<String, Workout>> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static BTreeMap<String, Workout> {
    &DEFAULT_CATALOG
}

/// Builds the built-in workouts, keyed by id
pub fn build_default_catalog() -> BTreeMap<String, Workout> {
    let workouts = vec![
        Workout {
            id: "full_body".into(),
            name: "Full Body Basics".into(),
            calories_burn: Some(180),
            exercises: vec![
                WorkoutExercise::new("goblet_squat", "Goblet Squat", 1, 3)
                    .with_timing(ExerciseTiming::Reps("8-12".into()))
                    .with_rest(60),
                WorkoutExercise::new("pushup", "Push-up", 2, 3)
                    .with_timing(ExerciseTiming::Reps("10".into()))
                    .with_rest(45),
                WorkoutExercise::new("kb_row", "Kettlebell Row", 3, 3)
                    .with_timing(ExerciseTiming::Reps("8 per side".into()))
                    .with_rest(45),
                WorkoutExercise::new("plank", "Plank", 4, 2)
                    .with_timing(ExerciseTiming::Timed(45))
                    .with_rest(30),
            ],
        },
        Workout {
            id: "core_blast".into(),
            name: "Core Blast".into(),
            calories_burn: None,
            exercises: vec![
                WorkoutExercise::new("dead_bug", "Dead Bug", 1, 2)
                    .with_timing(ExerciseTiming::Reps("12".into()))
                    .with_rest(20),
                WorkoutExercise::new("hollow_hold", "Hollow Hold", 2, 3)
                    .with_timing(ExerciseTiming::Timed(30))
                    .with_rest(20),
                WorkoutExercise::new("mountain_climber", "Mountain Climbers", 3, 2)
                    .with_timing(ExerciseTiming::RepsAndTimed {
                        reps: "as many as possible".into(),
                        seconds: 40,
                    }),
            ],
        },
        Workout {
            id: "burpee_ladder".into(),
            name: "Burpee Finisher".into(),
            calories_burn: None,
            exercises: vec![
                WorkoutExercise::new("burpee", "Burpee", 1, 3)
                    .with_timing(ExerciseTiming::Reps("5".into()))
                    .with_rest(30),
                WorkoutExercise::new("max_pushup", "Max Push-ups", 2, 1),
            ],
        },
    ];

    workouts.into_iter().map(|w| (w.id.clone(), w)).collect()
}

/// Load a workout from a JSON file and validate it
pub fn load_workout_file(path: &Path) -> Result<Workout> {
    let contents = std::fs::read_to_string(path)?;
    let workout: Workout = serde_json::from_str(&contents)?;

    let errors = workout.validate();
    if !errors.is_empty() {
        return Err(Error::Workout(errors.join("; ")));
    }

    tracing::info!("Loaded workout '{}' from {:?}", workout.id, path);
    Ok(workout)
}

/// Resolve a catalog id or a path to a workout file
pub fn resolve_workout(reference: &str) -> Result<Workout> {
    if let Some(workout) = default_catalog().get(reference) {
        return Ok(workout.clone());
    }

    let path = Path::new(reference);
    if path.exists() {
        return load_workout_file(path);
    }

    Err(Error::Workout(format!(
        "'{}' is neither a built-in workout nor a workout file",
        reference
    )))
}
