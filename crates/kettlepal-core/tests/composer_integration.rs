//! Integration tests for the workout composer.
//!
//! The composer runs against an in-memory `WorkoutApi` that records every
//! call and can fail a chosen one, so commit sequencing, partial failure
//! and retry can be checked without a server.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kettlepal_core::api::{
    AddExerciseInput, EditExerciseInput, EditWorkoutInput, Exercise, Workout, WorkoutApi,
    WorkoutInput,
};
use kettlepal_core::compose::{
    Composer, ComposerState, ExerciseEdit, Outcome, SaveRequest, WeightUnit, WorkoutEdit,
    WorkoutTarget, GENERIC_SAVE_ERROR,
};
use kettlepal_core::error::{ApiError, ComposeError, CoreError};
use kettlepal_core::events::Event;
use kettlepal_core::storage::ComposerConfig;
use kettlepal_core::validation::{FieldRef, Rule};
use serde_json::json;

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    /// JSON bodies of the update calls, in call order.
    edits: Vec<serde_json::Value>,
    next_uid: u32,
    /// Index into `calls` of the call that should fail, with its error.
    fail_at: Option<(usize, ApiError)>,
}

#[derive(Default)]
struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    fn failing_at(call: usize, error: ApiError) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().fail_at = Some((call, error));
        api
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn edits(&self) -> Vec<serde_json::Value> {
        self.state.lock().unwrap().edits.clone()
    }

    fn record_edits<T: serde::Serialize>(&self, edits: &T) {
        let value = serde_json::to_value(edits).unwrap();
        self.state.lock().unwrap().edits.push(value);
    }

    fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Record the call and hand out a fresh uid, or the injected error.
    fn record(&self, call: String) -> Result<String, ApiError> {
        let mut state = self.state.lock().unwrap();
        let index = state.calls.len();
        state.calls.push(call);
        if state.fail_at.as_ref().is_some_and(|(at, _)| *at == index) {
            let (_, error) = state.fail_at.take().unwrap();
            return Err(error);
        }
        state.next_uid += 1;
        Ok(format!("uid-{}", state.next_uid))
    }
}

fn workout_record(uid: String, input: &WorkoutInput) -> Workout {
    Workout {
        uid,
        user_uid: None,
        start_time: input.start_time,
        end_time: input.end_time,
        comment: input.comment.clone(),
        exercises: None,
    }
}

fn exercise_record(uid: String, title: &str) -> Exercise {
    Exercise {
        uid,
        workout_uid: None,
        title: title.to_string(),
        weight: None,
        weight_unit: None,
        sets: None,
        reps: None,
        reps_display: None,
        comment: None,
        start_time: None,
        end_time: None,
    }
}

#[async_trait]
impl WorkoutApi for FakeApi {
    async fn workout(&self, _uid: &str) -> Result<Option<Workout>, ApiError> {
        Ok(None)
    }

    async fn add_workout(&self, user_uid: &str, input: &WorkoutInput) -> Result<Workout, ApiError> {
        let uid = self.record(format!("addWorkout:{user_uid}"))?;
        Ok(workout_record(uid, input))
    }

    async fn update_workout(&self, uid: &str, edits: &EditWorkoutInput) -> Result<Workout, ApiError> {
        self.record_edits(edits);
        self.record(format!("updateWorkout:{uid}"))?;
        let input = WorkoutInput {
            start_time: edits.start_time,
            end_time: edits.end_time,
            comment: edits.comment.clone().flatten(),
        };
        Ok(workout_record(uid.to_string(), &input))
    }

    async fn add_exercise(
        &self,
        workout_uid: &str,
        input: &AddExerciseInput,
    ) -> Result<Exercise, ApiError> {
        let uid = self.record(format!("addExercise:{workout_uid}:{}", input.title))?;
        Ok(exercise_record(uid, &input.title))
    }

    async fn update_exercise(
        &self,
        uid: &str,
        edits: &EditExerciseInput,
    ) -> Result<Exercise, ApiError> {
        self.record_edits(edits);
        self.record(format!("updateExercise:{uid}"))?;
        Ok(exercise_record(uid.to_string(), edits.title.as_deref().unwrap_or_default()))
    }

    async fn delete_exercise(&self, uid: &str) -> Result<Vec<Exercise>, ApiError> {
        self.record(format!("deleteExercise:{uid}"))?;
        Ok(Vec::new())
    }
}

fn march_9() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
}

fn add_bench_press(composer: &mut Composer) {
    composer.handle_add_exercise().unwrap();
    let index = composer.draft().exercises.len() - 1;
    for edit in [
        ExerciseEdit::Title("Bench Press".into()),
        ExerciseEdit::Sets(Some(3)),
        ExerciseEdit::Reps(Some(10)),
        ExerciseEdit::Weight(Some(135.0)),
        ExerciseEdit::WeightUnit(Some(WeightUnit::Lb)),
    ] {
        assert!(composer.handle_exercise(index, edit).unwrap());
    }
}

fn add_titled(composer: &mut Composer, title: &str) {
    composer.handle_add_exercise().unwrap();
    let index = composer.draft().exercises.len() - 1;
    composer
        .handle_exercise(index, ExerciseEdit::Title(title.into()))
        .unwrap();
}

fn valid_composer() -> Composer {
    let mut composer = Composer::default();
    composer
        .handle_state_change(WorkoutEdit::CreatedAt(Some(march_9())))
        .unwrap();
    add_bench_press(&mut composer);
    composer
}

fn draft_json(composer: &Composer) -> serde_json::Value {
    serde_json::to_value(composer.draft()).unwrap()
}

#[test]
fn test_empty_workout_is_blocked() {
    let mut composer = Composer::default();
    composer
        .handle_state_change(WorkoutEdit::CreatedAt(Some(march_9())))
        .unwrap();
    assert!(composer.visible_violations().is_empty());

    let SaveRequest::Blocked(violations) = composer.request_save().unwrap() else {
        panic!("empty workout must not reach confirmation");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation.field, FieldRef::Exercises);
    assert_eq!(violations[0].violation.rule, Rule::Required);
    assert_eq!(composer.state(), ComposerState::Composing);
    assert!(!composer.is_open_save_confirmation());
    assert!(composer.submitted());
    assert_eq!(composer.visible_violations(), violations);
}

#[test]
fn test_weight_without_unit_is_blocked() {
    let mut composer = Composer::default();
    composer
        .handle_state_change(WorkoutEdit::CreatedAt(Some(march_9())))
        .unwrap();
    add_titled(&mut composer, "Swing");
    composer
        .handle_exercise(0, ExerciseEdit::Weight(Some(50.0)))
        .unwrap();

    let SaveRequest::Blocked(violations) = composer.request_save().unwrap() else {
        panic!("weight without unit must not reach confirmation");
    };
    let key = composer.draft().exercises.key_at(0);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].slot, key);
    assert_eq!(violations[0].violation.rule, Rule::UnitRequiredWithWeight);
    assert_eq!(
        violations[0].violation.message(),
        "Weight unit is required when a weight is entered"
    );
}

#[test]
fn test_non_finite_weight_is_blocked() {
    let mut composer = valid_composer();
    composer
        .handle_exercise(0, ExerciseEdit::Weight(Some(f64::NAN)))
        .unwrap();

    let SaveRequest::Blocked(violations) = composer.request_save().unwrap() else {
        panic!("NaN weight must not reach confirmation");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation.rule, Rule::NotANumber);
    assert_eq!(composer.state(), ComposerState::Composing);
}

#[test]
fn test_default_weight_unit_fills_missing_unit() {
    let mut composer = Composer::new(ComposerConfig {
        default_weight_unit: Some(WeightUnit::Kg),
        ..ComposerConfig::default()
    });
    add_titled(&mut composer, "Swing");
    composer
        .handle_exercise(0, ExerciseEdit::Weight(Some(24.0)))
        .unwrap();
    let key = composer.draft().exercises.key_at(0).unwrap();
    assert_eq!(
        composer.draft().exercises.get(key).unwrap().weight_unit,
        Some(WeightUnit::Kg)
    );
}

#[test]
fn test_out_of_range_index_is_ignored() {
    let mut composer = Composer::default();
    add_titled(&mut composer, "Swing");
    let before = draft_json(&composer);

    assert!(!composer
        .handle_exercise(4, ExerciseEdit::Title("Press".into()))
        .unwrap());
    assert!(composer.delete_exercise(4).unwrap().is_none());
    assert_eq!(draft_json(&composer), before);
}

#[test]
fn test_delete_keeps_form_errors_current() {
    let mut composer = Composer::default();
    composer
        .handle_state_change(WorkoutEdit::CreatedAt(Some(march_9())))
        .unwrap();
    add_bench_press(&mut composer);
    composer.handle_add_exercise().unwrap();
    assert!(composer.form_has_errors());

    let removed = composer.delete_exercise(1).unwrap();
    assert!(removed.is_some());
    assert!(!composer.form_has_errors());

    composer.delete_exercise(0).unwrap();
    assert!(composer.form_has_errors());
}

#[test]
fn test_confirmation_lines() {
    let mut composer = valid_composer();
    let SaveRequest::Confirm(confirmation) = composer.request_save().unwrap() else {
        panic!("valid workout should open the confirmation");
    };
    assert_eq!(
        confirmation.lines(),
        vec![
            "Saturday, March 09, 2024".to_string(),
            "Bench Press: 3 x 10 @ 135 lb".to_string(),
        ]
    );
    assert!(composer.is_open_save_confirmation());
    assert_eq!(composer.confirmation(), Some(confirmation));
}

#[test]
fn test_cancel_leaves_draft_unchanged() {
    let mut composer = valid_composer();
    let before = draft_json(&composer);

    composer.request_save().unwrap();
    assert!(matches!(
        composer.handle_add_exercise(),
        Err(ComposeError::InvalidTransition { .. })
    ));
    composer.cancel_save().unwrap();

    assert_eq!(composer.state(), ComposerState::Composing);
    assert_eq!(draft_json(&composer), before);
    assert!(composer.cancel_save().is_err());
}

#[tokio::test]
async fn test_successful_commit_resets_draft() {
    let api = FakeApi::default();
    let mut composer = valid_composer();
    composer.toggle_workout_comment();
    composer
        .handle_state_change(WorkoutEdit::Comment(Some("felt strong".into())))
        .unwrap();
    composer.request_save().unwrap();

    let outcome = composer.confirm_save(&api, "user-1").await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Saved {
            workout_uid: "uid-1".into(),
            exercise_count: 1,
        }
    );
    assert_eq!(
        api.calls(),
        vec![
            "addWorkout:user-1".to_string(),
            "addExercise:uid-1:Bench Press".to_string(),
        ]
    );
    assert!(composer.show_upload_success());
    assert!(!composer.show_server_error());
    assert!(!composer.loading());
    assert_eq!(composer.state(), ComposerState::Composing);
    assert!(composer.draft().exercises.is_empty());
    assert!(composer.draft().created_at.is_none());
    assert!(composer.draft().comment.is_none());
    assert!(!composer.submitted());
    assert_eq!(composer.elapsed_seconds(), 0);
    assert!(composer.workout_uid().is_none());
    assert!(composer
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::TimerReset { .. })));

    composer.dismiss_success();
    assert!(!composer.show_upload_success());
}

#[tokio::test]
async fn test_edits_rejected_while_committing() {
    let api = FakeApi::default();
    let mut composer = valid_composer();
    composer.request_save().unwrap();

    let plan = composer.begin_commit("user-1").unwrap();
    assert!(composer.loading());
    assert!(!composer.is_open_save_confirmation());
    assert_eq!(composer.handle_add_exercise(), Err(ComposeError::Busy));
    assert_eq!(
        composer.handle_state_change(WorkoutEdit::Comment(None)),
        Err(ComposeError::Busy)
    );
    assert_eq!(
        composer.handle_exercise(0, ExerciseEdit::Sets(Some(5))),
        Err(ComposeError::Busy)
    );
    assert_eq!(composer.delete_exercise(0), Err(ComposeError::Busy));
    assert_eq!(composer.set_time(10), Err(ComposeError::Busy));
    assert_eq!(composer.start_timer(), Err(ComposeError::Busy));
    assert_eq!(composer.toggle_timer(), Err(ComposeError::Busy));
    assert!(!composer.timer_is_active());
    assert!(matches!(composer.request_save(), Err(ComposeError::Busy)));

    let result = kettlepal_core::compose::run_commit(&api, &plan).await;
    composer.finish_commit(result).unwrap();
    assert!(!composer.loading());
    assert!(composer.handle_add_exercise().is_ok());
}

#[tokio::test]
async fn test_partial_failure_preserves_drafts_and_retry_updates() {
    let api = FakeApi::failing_at(
        2,
        ApiError::GraphQl {
            message: "exercise title too long".into(),
        },
    );
    let mut composer = valid_composer();
    add_titled(&mut composer, "Goblet Squat");
    composer.request_save().unwrap();
    let before = draft_json(&composer);

    let outcome = composer.confirm_save(&api, "user-1").await.unwrap();

    let Outcome::Failed { error, dismissed } = outcome else {
        panic!("second exercise failure must not report success");
    };
    assert!(!dismissed);
    assert_eq!(error.message, "exercise title too long");
    assert!(error.is_partial());
    assert_eq!(error.progress.workout_uid.as_deref(), Some("uid-1"));
    assert_eq!(error.progress.exercises.len(), 1);
    assert!(composer.show_server_error());
    assert!(!composer.show_upload_success());
    assert_eq!(composer.state(), ComposerState::Composing);
    assert_eq!(draft_json(&composer), before);
    assert_eq!(composer.workout_uid(), Some("uid-1"));

    // Retry: the workout and first exercise exist, so they are updated.
    api.clear_calls();
    composer.request_save().unwrap();
    assert!(composer.error().is_some());
    let outcome = composer.confirm_save(&api, "user-1").await.unwrap();

    assert!(matches!(outcome, Outcome::Saved { exercise_count: 2, .. }));
    assert_eq!(
        api.calls(),
        vec![
            "updateWorkout:uid-1".to_string(),
            "updateExercise:uid-2".to_string(),
            "addExercise:uid-1:Goblet Squat".to_string(),
        ]
    );
    assert!(composer.error().is_none());
}

#[tokio::test]
async fn test_blank_server_message_falls_back() {
    let api = FakeApi::failing_at(0, ApiError::Status { status: 502 });
    let mut composer = valid_composer();
    composer.request_save().unwrap();

    composer.confirm_save(&api, "user-1").await.unwrap();

    let error = composer.error().unwrap();
    assert_eq!(error.message, GENERIC_SAVE_ERROR);
    assert!(!error.is_partial());
    assert!(composer.workout_uid().is_none());
}

#[tokio::test]
async fn test_dismiss_error_keeps_details() {
    let api = FakeApi::failing_at(
        0,
        ApiError::GraphQl {
            message: "Workout date is invalid".into(),
        },
    );
    let mut composer = valid_composer();
    composer.toggle_tracking();
    composer.request_save().unwrap();
    composer.confirm_save(&api, "user-1").await.unwrap();
    assert!(composer.show_server_error());

    composer.dismiss_server_error();

    assert!(!composer.show_server_error());
    assert_eq!(
        composer.error().map(|e| e.message.as_str()),
        Some("Workout date is invalid")
    );
    assert!(composer.show_tracking());
    assert_eq!(composer.draft().exercises.len(), 1);
}

fn saved_workout() -> Workout {
    let mut squat = exercise_record("ex-2".into(), "Squat");
    squat.weight = Some(100.0);
    squat.weight_unit = Some("kg".into());
    squat.reps_display = Some("5-5-3".into());
    Workout {
        uid: "w-1".into(),
        user_uid: Some("user-1".into()),
        start_time: Some(march_9()),
        end_time: Some(march_9() + chrono::TimeDelta::minutes(30)),
        comment: Some("leg day".into()),
        exercises: Some(vec![exercise_record("ex-1".into(), "Row"), squat]),
    }
}

#[test]
fn test_for_edit_maps_wire_records() {
    let mut composer = Composer::for_edit(&saved_workout(), ComposerConfig::default());

    assert_eq!(composer.workout_uid(), Some("w-1"));
    assert_eq!(composer.elapsed_seconds(), 1800);
    assert_eq!(composer.draft().elapsed_seconds, 1800);
    assert_eq!(composer.draft().created_at, Some(march_9()));
    assert!(composer.add_workout_comment());
    assert_eq!(composer.draft().exercises.len(), 2);

    let key = composer.draft().exercises.key_at(1).unwrap();
    let squat = composer.draft().exercises.get(key).unwrap();
    assert_eq!(squat.weight_unit, Some(WeightUnit::Kg));
    assert_eq!(squat.reps_display.as_deref(), Some("5-5-3"));

    let events = composer.drain_events();
    assert!(matches!(
        events.as_slice(),
        [Event::EditLoaded { exercise_count: 2, .. }]
    ));
}

#[tokio::test]
async fn test_edit_commit_updates_and_deletes_removed() {
    let api = FakeApi::default();
    let mut composer = Composer::for_edit(&saved_workout(), ComposerConfig::default());
    composer.delete_exercise(0).unwrap();
    add_titled(&mut composer, "Deadlift");
    composer.request_save().unwrap();

    let plan = composer.begin_commit("ignored").unwrap();
    assert_eq!(
        plan.target,
        WorkoutTarget::Update {
            workout_uid: "w-1".into()
        }
    );
    assert_eq!(plan.removed, vec!["ex-1".to_string()]);
    assert_eq!(plan.workout.comment.as_deref(), Some("leg day"));
    assert_eq!(plan.call_count(), 4);

    let result = kettlepal_core::compose::run_commit(&api, &plan).await;
    composer.finish_commit(result).unwrap();

    assert_eq!(
        api.calls(),
        vec![
            "updateWorkout:w-1".to_string(),
            "updateExercise:ex-2".to_string(),
            "addExercise:w-1:Deadlift".to_string(),
            "deleteExercise:ex-1".to_string(),
        ]
    );
    assert!(composer.show_upload_success());
}

#[tokio::test]
async fn test_edit_sends_null_for_cleared_fields() {
    let api = FakeApi::default();
    let mut composer = Composer::for_edit(&saved_workout(), ComposerConfig::default());
    composer.handle_state_change(WorkoutEdit::Comment(None)).unwrap();
    composer.handle_exercise(1, ExerciseEdit::Weight(None)).unwrap();
    composer.handle_exercise(1, ExerciseEdit::WeightUnit(None)).unwrap();
    composer.request_save().unwrap();

    let plan = composer.begin_commit("ignored").unwrap();
    assert!(plan.clear_comment);
    let result = kettlepal_core::compose::run_commit(&api, &plan).await;
    composer.finish_commit(result).unwrap();

    assert_eq!(
        api.edits(),
        vec![
            json!({
                "start_time": "2024-03-09T12:00:00Z",
                "end_time": "2024-03-09T12:30:00Z",
                "comment": null
            }),
            json!({ "title": "Row" }),
            json!({
                "title": "Squat",
                "weight": null,
                "weight_unit": null,
                "reps_display": "5-5-3"
            }),
        ]
    );
    assert!(composer.show_upload_success());
}

#[tokio::test]
async fn test_edit_without_changes_clears_nothing() {
    let api = FakeApi::default();
    let mut composer = Composer::for_edit(&saved_workout(), ComposerConfig::default());
    composer.request_save().unwrap();
    composer.confirm_save(&api, "ignored").await.unwrap();

    let edits = api.edits();
    assert_eq!(edits[0]["comment"], "leg day");
    assert_eq!(
        edits[2],
        json!({
            "title": "Squat",
            "weight": 100.0,
            "weight_unit": "kg",
            "reps_display": "5-5-3"
        })
    );
}

#[tokio::test]
async fn test_hidden_sections_are_not_submitted() {
    let mut composer = valid_composer();
    composer
        .handle_state_change(WorkoutEdit::Comment(Some("hidden".into())))
        .unwrap();
    composer
        .handle_exercise(0, ExerciseEdit::StartTime(Some(march_9())))
        .unwrap();
    assert!(!composer.add_workout_comment());
    assert!(!composer.show_tracking());
    composer.request_save().unwrap();

    let plan = composer.begin_commit("user-1").unwrap();
    assert!(plan.workout.comment.is_none());
    assert!(plan.exercises[0].draft.start_time.is_none());
    assert_eq!(composer.draft().comment.as_deref(), Some("hidden"));
}

#[tokio::test(start_paused = true)]
async fn test_timer_feeds_draft_and_stops_on_commit() {
    let mut composer = valid_composer();
    composer.start_timer().unwrap();
    assert!(composer.timer_is_active());

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(composer.elapsed_seconds(), 3);

    composer.request_save().unwrap();
    composer.begin_commit("user-1").unwrap();
    assert!(!composer.timer_is_active());
    assert_eq!(composer.draft().elapsed_seconds, 3);

    let events = composer.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TimerStopped { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CommitStarted { exercise_count: 1, .. })));
}

#[test]
fn test_set_time_updates_draft() {
    let mut composer = Composer::default();
    composer.set_time(754).unwrap();
    assert_eq!(composer.draft().elapsed_seconds, 754);
    composer.reset_timer().unwrap();
    assert_eq!(composer.draft().elapsed_seconds, 0);
}

#[tokio::test]
async fn test_load_missing_workout() {
    let api = FakeApi::default();
    let err = Composer::load(&api, "w-404", ComposerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Custom(ref m) if m == "Workout not found: w-404"));
}
