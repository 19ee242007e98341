//! GraphQL wire types.
//!
//! The server schema is snake_case (`weight_unit`, `reps_display`, ...).
//! Conversions between these records and the composer's drafts live here so
//! the mapping is done the same way for load-for-edit and for submit.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::compose::{ExerciseDraft, WeightUnit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_authorized: Option<bool>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub workouts: Option<Vec<Workout>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub uid: String,
    #[serde(default)]
    pub user_uid: Option<String>,
    /// The workout date; the session runs from here to `end_time`.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub exercises: Option<Vec<Exercise>>,
}

impl Workout {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Session length; 0 when either end is missing or they are inverted.
    pub fn elapsed_seconds(&self) -> u64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => u64::try_from((end - start).num_seconds()).unwrap_or(0),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub uid: String,
    #[serde(default)]
    pub workout_uid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub weight: Option<f64>,
    /// Kept as text: older records may carry units this client does not know.
    #[serde(default)]
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub sets: Option<i64>,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub reps_display: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

// ── Inputs ───────────────────────────────────────────────────────────
//
// Add-inputs omit server-generated fields. Edit-inputs are all-optional:
// an absent field is left unchanged by the server, while `Some(None)`
// serializes as an explicit `null` and clears it.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// `AddOrEditWorkoutInput` as sent by `addWorkout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl WorkoutInput {
    /// The server stores a time span: it starts at the workout date and
    /// ends `elapsed_seconds` later.
    pub fn new(created_at: Option<DateTime<Utc>>, elapsed_seconds: u64, comment: Option<String>) -> Self {
        let end_time = created_at.and_then(|start| {
            let elapsed = i64::try_from(elapsed_seconds).ok()?;
            start.checked_add_signed(TimeDelta::try_seconds(elapsed)?)
        });
        Self {
            start_time: created_at,
            end_time,
            comment,
        }
    }
}

/// `AddOrEditWorkoutInput` as sent by `updateWorkout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditWorkoutInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Option<String>>,
}

impl EditWorkoutInput {
    /// `clear_comment` sends `null` for a comment that is absent from
    /// `input` but present on the server.
    pub fn new(input: &WorkoutInput, clear_comment: bool) -> Self {
        Self {
            start_time: input.start_time,
            end_time: input.end_time,
            comment: patch(input.comment.clone(), clear_comment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddExerciseInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditExerciseInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps_display: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<DateTime<Utc>>>,
}

/// Set when present, `null` when cleared since the last save, else absent.
fn patch<T>(current: Option<T>, was_set: bool) -> Option<Option<T>> {
    match current {
        Some(value) => Some(Some(value)),
        None if was_set => Some(None),
        None => None,
    }
}

// ── Draft <-> wire mapping ───────────────────────────────────────────

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl From<&ExerciseDraft> for AddExerciseInput {
    fn from(draft: &ExerciseDraft) -> Self {
        Self {
            title: draft.title.trim().to_string(),
            weight: draft.weight,
            weight_unit: draft.weight_unit.map(|u| u.as_str().to_string()),
            sets: draft.sets,
            reps: draft.reps,
            reps_display: non_blank(&draft.reps_display),
            comment: non_blank(&draft.comment),
            start_time: draft.start_time,
            end_time: draft.end_time,
        }
    }
}

impl EditExerciseInput {
    /// Edits that turn the saved `previous` into `current`. Fields cleared
    /// since `previous` are sent as `null`.
    pub fn from_changes(previous: Option<&ExerciseDraft>, current: &ExerciseDraft) -> Self {
        let add = AddExerciseInput::from(current);
        let saved = previous.map(AddExerciseInput::from);
        let was = |set: fn(&AddExerciseInput) -> bool| saved.as_ref().is_some_and(set);
        Self {
            title: Some(add.title),
            weight: patch(add.weight, was(|s| s.weight.is_some())),
            weight_unit: patch(add.weight_unit, was(|s| s.weight_unit.is_some())),
            sets: patch(add.sets, was(|s| s.sets.is_some())),
            reps: patch(add.reps, was(|s| s.reps.is_some())),
            reps_display: patch(add.reps_display, was(|s| s.reps_display.is_some())),
            comment: patch(add.comment, was(|s| s.comment.is_some())),
            start_time: patch(add.start_time, was(|s| s.start_time.is_some())),
            end_time: patch(add.end_time, was(|s| s.end_time.is_some())),
        }
    }
}

impl From<&ExerciseDraft> for EditExerciseInput {
    fn from(draft: &ExerciseDraft) -> Self {
        Self::from_changes(None, draft)
    }
}

impl From<&Exercise> for ExerciseDraft {
    fn from(record: &Exercise) -> Self {
        let weight_unit = record.weight_unit.as_deref().and_then(|raw| {
            raw.parse::<WeightUnit>()
                .map_err(|_| {
                    tracing::warn!(exercise = %record.uid, unit = raw, "dropping unknown weight unit");
                })
                .ok()
        });
        Self {
            title: record.title.clone(),
            weight: record.weight,
            weight_unit,
            sets: record.sets,
            reps: record.reps,
            reps_display: record.reps_display.clone(),
            comment: record.comment.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
        }
    }
}
