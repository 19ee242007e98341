//! Draft validation.
//!
//! Every function here is pure: the output depends only on the draft passed
//! in. Whether the violations are shown is the composer's business (see
//! `Composer::visible_violations`), not the validator's.

use std::fmt;

use serde::Serialize;

use crate::compose::{ExerciseDraft, ExerciseField, SlotKey, WorkoutDraft};

/// Which input a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "scope", content = "field")]
pub enum FieldRef {
    /// The workout date.
    CreatedAt,
    /// The workout's exercise list as a whole.
    Exercises,
    Exercise(ExerciseField),
}

/// The rule a field breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    /// A weight was given without a unit.
    UnitRequiredWithWeight,
    /// A unit was given without a weight.
    WeightRequiredWithUnit,
    Negative,
    /// NaN or infinite.
    NotANumber,
    /// End time earlier than start time.
    EndsBeforeStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub field: FieldRef,
    pub rule: Rule,
}

impl Violation {
    pub fn new(field: FieldRef, rule: Rule) -> Self {
        Self { field, rule }
    }

    pub fn message(&self) -> String {
        match (self.field, self.rule) {
            (FieldRef::CreatedAt, _) => "Workout date is required".to_string(),
            (FieldRef::Exercises, _) => "Add at least one exercise before saving".to_string(),
            (FieldRef::Exercise(f), Rule::Required) => format!("{} is required", f.label()),
            (FieldRef::Exercise(_), Rule::UnitRequiredWithWeight) => {
                "Weight unit is required when a weight is entered".to_string()
            }
            (FieldRef::Exercise(_), Rule::WeightRequiredWithUnit) => {
                "Weight is required when a weight unit is selected".to_string()
            }
            (FieldRef::Exercise(f), Rule::Negative) => format!("{} cannot be negative", f.label()),
            (FieldRef::Exercise(f), Rule::NotANumber) => format!("{} must be a number", f.label()),
            (FieldRef::Exercise(_), Rule::EndsBeforeStart) => {
                "End time cannot be before start time".to_string()
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A violation plus the slot it was found in (`None` for workout-level ones).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located {
    pub slot: Option<SlotKey>,
    pub violation: Violation,
}

/// Workout-level rules: a date is set and there is at least one exercise.
pub fn validate_workout(draft: &WorkoutDraft) -> Vec<Violation> {
    let mut out = Vec::new();
    if draft.created_at.is_none() {
        out.push(Violation::new(FieldRef::CreatedAt, Rule::Required));
    }
    if draft.exercises.is_empty() {
        out.push(Violation::new(FieldRef::Exercises, Rule::Required));
    }
    out
}

/// Per-exercise rules, one violation per broken rule.
pub fn validate_exercise(exercise: &ExerciseDraft) -> Vec<Violation> {
    let mut out = Vec::new();
    let v = |field, rule| Violation::new(FieldRef::Exercise(field), rule);

    if exercise.title.trim().is_empty() {
        out.push(v(ExerciseField::Title, Rule::Required));
    }

    match (exercise.weight, exercise.weight_unit) {
        (Some(_), None) => out.push(v(ExerciseField::WeightUnit, Rule::UnitRequiredWithWeight)),
        (None, Some(_)) => out.push(v(ExerciseField::Weight, Rule::WeightRequiredWithUnit)),
        _ => {}
    }

    match exercise.weight {
        Some(w) if !w.is_finite() => out.push(v(ExerciseField::Weight, Rule::NotANumber)),
        Some(w) if w < 0.0 => out.push(v(ExerciseField::Weight, Rule::Negative)),
        _ => {}
    }
    if exercise.sets.is_some_and(|s| s < 0) {
        out.push(v(ExerciseField::Sets, Rule::Negative));
    }
    if exercise.reps.is_some_and(|r| r < 0) {
        out.push(v(ExerciseField::Reps, Rule::Negative));
    }

    if let (Some(start), Some(end)) = (exercise.start_time, exercise.end_time) {
        if end < start {
            out.push(v(ExerciseField::EndTime, Rule::EndsBeforeStart));
        }
    }
    out
}

/// Workout-level violations first, then every slot's in display order.
pub fn validate_all(draft: &WorkoutDraft) -> Vec<Located> {
    let workout = validate_workout(draft).into_iter().map(|violation| Located {
        slot: None,
        violation,
    });
    let exercises = draft.exercises.iter().flat_map(|slot| {
        validate_exercise(&slot.draft)
            .into_iter()
            .map(move |violation| Located {
                slot: Some(slot.key),
                violation,
            })
    });
    workout.chain(exercises).collect()
}
