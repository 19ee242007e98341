//! Workout composer: the form lifecycle of one workout.
//!
//! ## State Transitions
//!
//! ```text
//! Composing --request_save (valid)--> AwaitingConfirmation --confirm--> Committing
//!     ^  \__request_save (blocked)__/        |                              |
//!     |_________________cancel_______________|                              |
//!     |____________________success (draft reset) / failure (draft kept)____|
//! ```
//!
//! There is exactly one authoritative [`ComposerState`]. Banner and modal
//! flags (`loading`, `show_server_error`, ...) are derived from it and from
//! the last commit [`Outcome`], never stored on their own.
//!
//! Exercises are addressed by [`SlotKey`]. The index-taking methods resolve
//! the index against the current order at call time; nothing caches
//! positions.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::commit::{
    run_commit, CommitError, CommitPlan, CommitReceipt, PlannedExercise, WorkoutTarget,
};
use super::draft::{ExerciseDraft, ExerciseEdit, WorkoutDraft, WorkoutEdit};
use super::slots::SlotKey;
use crate::api::{Exercise, Workout, WorkoutApi, WorkoutInput};
use crate::error::{ComposeError, CoreError, Result};
use crate::events::Event;
use crate::storage::ComposerConfig;
use crate::summary::Confirmation;
use crate::timer::SessionTimer;
use crate::validation::{self, Located};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Composing,
    AwaitingConfirmation,
    Committing,
}

impl fmt::Display for ComposerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComposerState::Composing => "composing",
            ComposerState::AwaitingConfirmation => "awaiting confirmation",
            ComposerState::Committing => "committing",
        })
    }
}

/// Inputs of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SaveBlocked,
    SaveAccepted,
    Cancel,
    Confirm,
    CommitSucceeded,
    CommitFailed,
}

impl Trigger {
    fn action(&self) -> &'static str {
        match self {
            Trigger::SaveBlocked | Trigger::SaveAccepted => "request a save",
            Trigger::Cancel => "cancel the save",
            Trigger::Confirm => "confirm the save",
            Trigger::CommitSucceeded | Trigger::CommitFailed => "finish a commit",
        }
    }
}

impl ComposerState {
    /// The transition table. `None` means the trigger is not accepted here.
    pub fn next(self, trigger: Trigger) -> Option<ComposerState> {
        use ComposerState::*;
        match (self, trigger) {
            (Composing, Trigger::SaveBlocked) => Some(Composing),
            (Composing, Trigger::SaveAccepted) => Some(AwaitingConfirmation),
            (AwaitingConfirmation, Trigger::Cancel) => Some(Composing),
            (AwaitingConfirmation, Trigger::Confirm) => Some(Committing),
            (Committing, Trigger::CommitSucceeded) => Some(Composing),
            (Committing, Trigger::CommitFailed) => Some(Composing),
            _ => None,
        }
    }
}

/// Result of the last commit attempt, as shown in the banners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Saved {
        workout_uid: String,
        exercise_count: usize,
    },
    Failed {
        error: CommitError,
        /// Banner hidden by the user; the error itself is kept.
        dismissed: bool,
    },
}

/// Answer to a save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    /// The draft has violations; they are now visible.
    Blocked(Vec<Located>),
    /// The confirmation surface is open.
    Confirm(Confirmation),
}

/// Server identities already attached to this draft, from an edit load or
/// from a partially failed commit.
#[derive(Debug, Clone, Default)]
struct Persisted {
    workout_uid: Option<String>,
    /// Workout comment as the server last returned it.
    comment: Option<String>,
    exercises: HashMap<SlotKey, SavedExercise>,
    /// Persisted exercises the user removed; deleted on the next commit.
    removed: Vec<String>,
}

/// A slot's server uid and the values the server holds for it.
#[derive(Debug, Clone)]
struct SavedExercise {
    uid: String,
    draft: ExerciseDraft,
}

impl From<&Exercise> for SavedExercise {
    fn from(record: &Exercise) -> Self {
        Self {
            uid: record.uid.clone(),
            draft: ExerciseDraft::from(record),
        }
    }
}

#[derive(Debug)]
pub struct Composer {
    draft: WorkoutDraft,
    timer: SessionTimer,
    state: ComposerState,
    submitted: bool,
    show_tracking: bool,
    add_workout_comment: bool,
    outcome: Option<Outcome>,
    persisted: Persisted,
    defaults: ComposerConfig,
    events: Vec<Event>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl Composer {
    pub fn new(defaults: ComposerConfig) -> Self {
        Self {
            draft: WorkoutDraft::new(),
            timer: SessionTimer::new(),
            state: ComposerState::Composing,
            submitted: false,
            show_tracking: defaults.show_tracking,
            add_workout_comment: defaults.add_workout_comment,
            outcome: None,
            persisted: Persisted::default(),
            defaults,
            events: Vec::new(),
        }
    }

    /// Load a saved workout for editing. Field names cross from the wire's
    /// snake_case records into the draft here.
    pub fn for_edit(workout: &Workout, defaults: ComposerConfig) -> Self {
        let mut composer = Self::new(defaults);
        composer.draft.created_at = workout.created_at();
        composer.draft.comment = workout.comment.clone();
        composer.persisted.comment = workout.comment.clone();
        composer.add_workout_comment |= workout
            .comment
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());

        let records = workout.exercises.as_deref().unwrap_or_default();
        for record in records {
            let saved = SavedExercise::from(record);
            composer.show_tracking |= saved.draft.start_time.is_some() || saved.draft.end_time.is_some();
            let key = composer.draft.exercises.push(saved.draft.clone());
            composer.persisted.exercises.insert(key, saved);
        }
        composer.persisted.workout_uid = Some(workout.uid.clone());

        let elapsed = workout.elapsed_seconds();
        composer.timer.set_elapsed(elapsed);
        composer.draft.elapsed_seconds = elapsed;

        composer.events.push(Event::EditLoaded {
            workout_uid: workout.uid.clone(),
            exercise_count: records.len(),
            at: Utc::now(),
        });
        composer
    }

    /// Fetch `uid` through `api` and load it for editing.
    pub async fn load<A>(api: &A, uid: &str, defaults: ComposerConfig) -> Result<Self>
    where
        A: WorkoutApi + ?Sized,
    {
        let workout = api
            .workout(uid)
            .await?
            .ok_or_else(|| CoreError::Custom(format!("Workout not found: {uid}")))?;
        Ok(Self::for_edit(&workout, defaults))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn draft(&self) -> &WorkoutDraft {
        &self.draft
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn show_tracking(&self) -> bool {
        self.show_tracking
    }

    pub fn add_workout_comment(&self) -> bool {
        self.add_workout_comment
    }

    pub fn timer_is_active(&self) -> bool {
        self.timer.is_running()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    /// uid of the workout being edited (or partially saved), if any.
    pub fn workout_uid(&self) -> Option<&str> {
        self.persisted.workout_uid.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.state == ComposerState::Committing
    }

    pub fn is_open_save_confirmation(&self) -> bool {
        self.state == ComposerState::AwaitingConfirmation
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Last commit error, kept even after its banner is dismissed.
    pub fn error(&self) -> Option<&CommitError> {
        match &self.outcome {
            Some(Outcome::Failed { error, .. }) => Some(error),
            _ => None,
        }
    }

    pub fn show_server_error(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Failed { dismissed: false, .. }))
    }

    pub fn show_upload_success(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Saved { .. }))
    }

    /// Every current violation, whether or not it is displayed.
    pub fn violations(&self) -> Vec<Located> {
        validation::validate_all(&self.draft)
    }

    /// Violations to display: none until a save has been requested.
    pub fn visible_violations(&self) -> Vec<Located> {
        if self.submitted {
            self.violations()
        } else {
            Vec::new()
        }
    }

    /// Recomputed on every call, so it cannot go stale after a delete.
    pub fn form_has_errors(&self) -> bool {
        !self.violations().is_empty()
    }

    /// Confirmation text, while the confirmation surface is open.
    pub fn confirmation(&self) -> Option<Confirmation> {
        self.is_open_save_confirmation()
            .then(|| Confirmation::from_draft(&self.draft))
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Field edits ──────────────────────────────────────────────────

    pub fn handle_state_change(&mut self, edit: WorkoutEdit) -> Result<(), ComposeError> {
        self.ensure_editable()?;
        self.draft.apply(edit);
        Ok(())
    }

    pub fn handle_add_exercise(&mut self) -> Result<SlotKey, ComposeError> {
        self.ensure_editable()?;
        let key = self.draft.exercises.add_slot();
        self.events.push(Event::ExerciseAdded {
            slot: key.value(),
            index: self.draft.exercises.len() - 1,
            at: Utc::now(),
        });
        Ok(key)
    }

    /// Edit the exercise currently displayed at `index`.
    ///
    /// Returns `Ok(false)` for an index with no exercise; that is a caller
    /// bug and is ignored.
    pub fn handle_exercise(&mut self, index: usize, edit: ExerciseEdit) -> Result<bool, ComposeError> {
        self.ensure_editable()?;
        match self.draft.exercises.key_at(index) {
            Some(key) => Ok(self.update_exercise(key, edit)),
            None => {
                tracing::debug!(index, "exercise edit for missing index ignored");
                Ok(false)
            }
        }
    }

    /// Edit by key. Unknown keys are ignored (`Ok(false)`).
    pub fn handle_exercise_key(&mut self, key: SlotKey, edit: ExerciseEdit) -> Result<bool, ComposeError> {
        self.ensure_editable()?;
        Ok(self.update_exercise(key, edit))
    }

    fn update_exercise(&mut self, key: SlotKey, edit: ExerciseEdit) -> bool {
        let fill_unit = match (&edit, self.defaults.default_weight_unit) {
            (ExerciseEdit::Weight(Some(_)), Some(unit)) => self
                .draft
                .exercises
                .get(key)
                .is_some_and(|ex| ex.weight_unit.is_none())
                .then_some(unit),
            _ => None,
        };

        let applied = self.draft.exercises.update_slot(key, edit);
        if !applied {
            tracing::debug!(%key, "exercise edit for missing slot ignored");
        } else if let Some(unit) = fill_unit {
            self.draft
                .exercises
                .update_slot(key, ExerciseEdit::WeightUnit(Some(unit)));
        }
        applied
    }

    /// Remove the exercise currently displayed at `index`.
    pub fn delete_exercise(&mut self, index: usize) -> Result<Option<ExerciseDraft>, ComposeError> {
        self.ensure_editable()?;
        let Some(key) = self.draft.exercises.key_at(index) else {
            tracing::debug!(index, "delete for missing index ignored");
            return Ok(None);
        };
        self.delete_exercise_key(key)
    }

    pub fn delete_exercise_key(&mut self, key: SlotKey) -> Result<Option<ExerciseDraft>, ComposeError> {
        self.ensure_editable()?;
        let index = self.draft.exercises.position(key);
        let removed = self.draft.exercises.remove_slot(key);
        if let (Some(_), Some(index)) = (&removed, index) {
            if let Some(saved) = self.persisted.exercises.remove(&key) {
                self.persisted.removed.push(saved.uid);
            }
            self.events.push(Event::ExerciseRemoved {
                slot: key.value(),
                index,
                at: Utc::now(),
            });
        }
        Ok(removed)
    }

    pub fn toggle_tracking(&mut self) -> bool {
        self.show_tracking = !self.show_tracking;
        self.show_tracking
    }

    pub fn toggle_workout_comment(&mut self) -> bool {
        self.add_workout_comment = !self.add_workout_comment;
        self.add_workout_comment
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_timer(&mut self) -> Result<(), ComposeError> {
        self.ensure_not_committing()?;
        if let Some(event) = self.timer.start()? {
            self.events.push(event);
        }
        Ok(())
    }

    pub fn stop_timer(&mut self) {
        if let Some(event) = self.timer.stop() {
            self.events.push(event);
        }
        self.sync_elapsed();
    }

    /// Start when idle, stop when running.
    pub fn toggle_timer(&mut self) -> Result<(), ComposeError> {
        if self.timer.is_running() {
            self.stop_timer();
            Ok(())
        } else {
            self.start_timer()
        }
    }

    pub fn reset_timer(&mut self) -> Result<(), ComposeError> {
        self.ensure_not_committing()?;
        let event = self.timer.reset();
        self.events.push(event);
        self.sync_elapsed();
        Ok(())
    }

    /// Set the elapsed time by hand.
    pub fn set_time(&mut self, seconds: u64) -> Result<(), ComposeError> {
        self.ensure_not_committing()?;
        let event = self.timer.set_elapsed(seconds);
        self.events.push(event);
        self.sync_elapsed();
        Ok(())
    }

    fn sync_elapsed(&mut self) {
        if self.state != ComposerState::Committing {
            self.draft.elapsed_seconds = self.timer.elapsed_seconds();
        }
    }

    // ── Save lifecycle ───────────────────────────────────────────────

    /// The user asked to save. Violations become visible; the confirmation
    /// opens only when there are none.
    pub fn request_save(&mut self) -> Result<SaveRequest, ComposeError> {
        self.ensure_not_committing()?;
        self.submitted = true;
        self.sync_elapsed();

        let violations = self.violations();
        if !violations.is_empty() {
            self.transition(Trigger::SaveBlocked)?;
            self.events.push(Event::SaveBlocked {
                violations: violations.iter().map(|l| l.violation.message()).collect(),
                at: Utc::now(),
            });
            return Ok(SaveRequest::Blocked(violations));
        }

        self.transition(Trigger::SaveAccepted)?;
        if matches!(self.outcome, Some(Outcome::Saved { .. })) {
            self.outcome = None;
        }
        self.events.push(Event::ConfirmationOpened {
            exercise_count: self.draft.exercises.len(),
            at: Utc::now(),
        });
        Ok(SaveRequest::Confirm(Confirmation::from_draft(&self.draft)))
    }

    /// Close the confirmation; the draft is left as it was.
    pub fn cancel_save(&mut self) -> Result<(), ComposeError> {
        self.transition(Trigger::Cancel)?;
        self.events.push(Event::ConfirmationCancelled { at: Utc::now() });
        Ok(())
    }

    /// Confirm the save and lock the draft. The returned plan is an owned
    /// snapshot; hand it to [`run_commit`] and the result to
    /// [`finish_commit`](Self::finish_commit).
    ///
    /// `user_uid` is only used when creating a new workout.
    pub fn begin_commit(&mut self, user_uid: &str) -> Result<CommitPlan, ComposeError> {
        if self.state == ComposerState::AwaitingConfirmation {
            self.stop_timer();
        }
        self.transition(Trigger::Confirm)?;
        self.outcome = None;

        let target = match &self.persisted.workout_uid {
            Some(uid) => WorkoutTarget::Update {
                workout_uid: uid.clone(),
            },
            None => WorkoutTarget::Create {
                user_uid: user_uid.to_string(),
            },
        };
        let comment = if self.add_workout_comment {
            self.draft
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        } else {
            None
        };
        let exercises: Vec<PlannedExercise> = self
            .draft
            .exercises
            .iter()
            .map(|slot| {
                let saved = self.persisted.exercises.get(&slot.key);
                let mut draft = slot.draft.clone();
                let mut previous = saved.map(|s| s.draft.clone());
                if !self.show_tracking {
                    for d in std::iter::once(&mut draft).chain(previous.as_mut()) {
                        d.start_time = None;
                        d.end_time = None;
                    }
                }
                PlannedExercise {
                    key: slot.key,
                    existing_uid: saved.map(|s| s.uid.clone()),
                    previous,
                    draft,
                }
            })
            .collect();
        let clear_comment = self.add_workout_comment
            && comment.is_none()
            && self.persisted.comment.as_deref().is_some_and(|c| !c.trim().is_empty());

        let plan = CommitPlan {
            target,
            workout: WorkoutInput::new(self.draft.created_at, self.draft.elapsed_seconds, comment),
            clear_comment,
            exercises,
            removed: self.persisted.removed.clone(),
        };

        tracing::info!(
            workout = ?self.persisted.workout_uid,
            exercises = plan.exercises.len(),
            calls = plan.call_count(),
            "committing workout"
        );
        self.events.push(Event::CommitStarted {
            workout_uid: self.persisted.workout_uid.clone(),
            exercise_count: plan.exercises.len(),
            at: Utc::now(),
        });
        Ok(plan)
    }

    /// Apply the result of a commit attempt.
    pub fn finish_commit(
        &mut self,
        result: Result<CommitReceipt, CommitError>,
    ) -> Result<&Outcome, ComposeError> {
        if self.state != ComposerState::Committing {
            return Err(ComposeError::InvalidTransition {
                state: self.state,
                action: Trigger::CommitSucceeded.action(),
            });
        }

        let outcome = match result {
            Ok(receipt) => {
                self.transition(Trigger::CommitSucceeded)?;
                tracing::info!(workout = %receipt.workout.uid, exercises = receipt.exercises.len(), "workout saved");
                self.events.push(Event::WorkoutSaved {
                    workout_uid: receipt.workout.uid.clone(),
                    exercise_count: receipt.exercises.len(),
                    at: Utc::now(),
                });
                self.reset_draft();
                Outcome::Saved {
                    workout_uid: receipt.workout.uid,
                    exercise_count: receipt.exercises.len(),
                }
            }
            Err(error) => {
                self.transition(Trigger::CommitFailed)?;
                tracing::warn!(
                    stage = ?error.stage,
                    partial = error.is_partial(),
                    detail = %error.detail,
                    "workout save failed"
                );
                self.absorb_progress(&error);
                self.events.push(Event::SaveFailed {
                    message: error.message.clone(),
                    workout_uid: error.progress.workout_uid.clone(),
                    at: Utc::now(),
                });
                Outcome::Failed {
                    error,
                    dismissed: false,
                }
            }
        };
        Ok(&*self.outcome.insert(outcome))
    }

    /// Confirm and run the whole commit against `api`.
    pub async fn confirm_save<A>(&mut self, api: &A, user_uid: &str) -> Result<Outcome, ComposeError>
    where
        A: WorkoutApi + ?Sized,
    {
        let plan = self.begin_commit(user_uid)?;
        let result = run_commit(api, &plan).await;
        self.finish_commit(result).cloned()
    }

    /// Hide the error banner. The error stays readable through
    /// [`error`](Self::error) until the next attempt replaces it.
    pub fn dismiss_server_error(&mut self) {
        if let Some(Outcome::Failed { dismissed, .. }) = &mut self.outcome {
            *dismissed = true;
        }
    }

    pub fn dismiss_success(&mut self) {
        if matches!(self.outcome, Some(Outcome::Saved { .. })) {
            self.outcome = None;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn transition(&mut self, trigger: Trigger) -> Result<(), ComposeError> {
        let next = self
            .state
            .next(trigger)
            .ok_or(ComposeError::InvalidTransition {
                state: self.state,
                action: trigger.action(),
            })?;
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, ?trigger, "composer transition");
        }
        self.state = next;
        Ok(())
    }

    fn ensure_not_committing(&self) -> Result<(), ComposeError> {
        if self.state == ComposerState::Committing {
            Err(ComposeError::Busy)
        } else {
            Ok(())
        }
    }

    /// Draft edits are only accepted while composing.
    fn ensure_editable(&self) -> Result<(), ComposeError> {
        match self.state {
            ComposerState::Composing => Ok(()),
            ComposerState::Committing => Err(ComposeError::Busy),
            ComposerState::AwaitingConfirmation => Err(ComposeError::InvalidTransition {
                state: self.state,
                action: "edit the workout",
            }),
        }
    }

    /// Remember what a failed attempt already wrote so the retry updates it.
    fn absorb_progress(&mut self, error: &CommitError) {
        if let Some(uid) = &error.progress.workout_uid {
            self.persisted.workout_uid = Some(uid.clone());
            self.persisted.comment = error.progress.workout_comment.clone();
        }
        for (key, record) in &error.progress.exercises {
            if self.draft.exercises.get(*key).is_some() {
                self.persisted.exercises.insert(*key, SavedExercise::from(record));
            }
        }
        self.persisted
            .removed
            .retain(|uid| !error.progress.deleted.contains(uid));
    }

    fn reset_draft(&mut self) {
        self.draft.exercises.clear();
        self.draft.created_at = None;
        self.draft.comment = None;
        let event = self.timer.reset();
        self.events.push(event);
        self.draft.elapsed_seconds = 0;
        self.submitted = false;
        self.persisted = Persisted::default();
        self.show_tracking = self.defaults.show_tracking;
        self.add_workout_comment = self.defaults.add_workout_comment;
    }
}
