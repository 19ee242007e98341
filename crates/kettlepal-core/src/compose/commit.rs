//! The commit transaction.
//!
//! A save is one user-facing action made of several independent remote
//! calls: create or update the workout, then create or update each exercise
//! in draft order, then delete exercises removed during an edit. The server
//! offers no transaction, so [`run_commit`] stops at the first failure and
//! reports a single [`CommitError`] carrying what had already been written.
//! The composer keeps that progress so a retry updates instead of duplicating.

use serde::Serialize;
use thiserror::Error;

use super::draft::ExerciseDraft;
use super::slots::SlotKey;
use crate::api::{
    AddExerciseInput, EditExerciseInput, EditWorkoutInput, Exercise, Workout, WorkoutApi,
    WorkoutInput,
};
use crate::error::ApiError;

/// Banner text when the server gives no usable message.
pub const GENERIC_SAVE_ERROR: &str =
    "Something went wrong while saving your workout. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkoutTarget {
    Create { user_uid: String },
    Update { workout_uid: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedExercise {
    pub key: SlotKey,
    /// Server uid when this exercise already exists.
    pub existing_uid: Option<String>,
    /// What the server holds for `existing_uid`; fields it has that the
    /// draft lacks are cleared.
    pub previous: Option<ExerciseDraft>,
    pub draft: ExerciseDraft,
}

/// Owned snapshot of everything one commit attempt sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitPlan {
    pub target: WorkoutTarget,
    pub workout: WorkoutInput,
    /// Send `null` for the comment on update.
    pub clear_comment: bool,
    pub exercises: Vec<PlannedExercise>,
    /// Persisted exercise uids to delete after the writes.
    pub removed: Vec<String>,
}

impl CommitPlan {
    /// Number of remote calls this plan issues.
    pub fn call_count(&self) -> usize {
        1 + self.exercises.len() + self.removed.len()
    }
}

/// Server state already written by a (possibly failed) attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitProgress {
    pub workout_uid: Option<String>,
    pub workout_comment: Option<String>,
    pub exercises: Vec<(SlotKey, Exercise)>,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CommitStage {
    Workout,
    Exercise { position: usize, key: SlotKey },
    Delete { position: usize },
}

/// One aggregate failure for the whole save.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct CommitError {
    /// User-facing banner text.
    pub message: String,
    /// Full description of the underlying failure, for logs.
    pub detail: String,
    pub stage: CommitStage,
    pub progress: CommitProgress,
}

impl CommitError {
    fn new(stage: CommitStage, source: ApiError, progress: CommitProgress) -> Self {
        Self {
            message: source
                .server_message()
                .unwrap_or(GENERIC_SAVE_ERROR)
                .to_string(),
            detail: source.to_string(),
            stage,
            progress,
        }
    }

    /// Whether the workout record itself was written before the failure.
    pub fn is_partial(&self) -> bool {
        self.progress.workout_uid.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    pub workout: Workout,
    pub exercises: Vec<Exercise>,
}

/// Issue the call sequence described by `plan`, stopping at the first error.
pub async fn run_commit<A>(api: &A, plan: &CommitPlan) -> Result<CommitReceipt, CommitError>
where
    A: WorkoutApi + ?Sized,
{
    let mut progress = CommitProgress::default();

    let workout = match &plan.target {
        WorkoutTarget::Create { user_uid } => api.add_workout(user_uid, &plan.workout).await,
        WorkoutTarget::Update { workout_uid } => {
            let edits = EditWorkoutInput::new(&plan.workout, plan.clear_comment);
            api.update_workout(workout_uid, &edits).await
        }
    }
    .map_err(|e| CommitError::new(CommitStage::Workout, e, progress.clone()))?;
    progress.workout_uid = Some(workout.uid.clone());
    progress.workout_comment = workout.comment.clone();
    tracing::debug!(workout = %workout.uid, "workout written");

    let mut exercises = Vec::with_capacity(plan.exercises.len());
    for (position, planned) in plan.exercises.iter().enumerate() {
        let written = match &planned.existing_uid {
            Some(uid) => {
                let edits = EditExerciseInput::from_changes(planned.previous.as_ref(), &planned.draft);
                api.update_exercise(uid, &edits).await
            }
            None => {
                api.add_exercise(&workout.uid, &AddExerciseInput::from(&planned.draft))
                    .await
            }
        };
        match written {
            Ok(record) => {
                progress.exercises.push((planned.key, record.clone()));
                exercises.push(record);
            }
            Err(e) => {
                let stage = CommitStage::Exercise {
                    position,
                    key: planned.key,
                };
                return Err(CommitError::new(stage, e, progress));
            }
        }
    }

    for (position, uid) in plan.removed.iter().enumerate() {
        if let Err(e) = api.delete_exercise(uid).await {
            return Err(CommitError::new(CommitStage::Delete { position }, e, progress));
        }
        progress.deleted.push(uid.clone());
    }

    Ok(CommitReceipt { workout, exercises })
}
