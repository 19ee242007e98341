use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change of the timer or the composer produces an Event.
/// Front ends render them; the CLI prints them with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Elapsed time was set by hand.
    TimerAdjusted {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    ExerciseAdded {
        slot: u64,
        index: usize,
        at: DateTime<Utc>,
    },
    ExerciseRemoved {
        slot: u64,
        index: usize,
        at: DateTime<Utc>,
    },
    /// A save request was refused because the draft has violations.
    SaveBlocked {
        violations: Vec<String>,
        at: DateTime<Utc>,
    },
    ConfirmationOpened {
        exercise_count: usize,
        at: DateTime<Utc>,
    },
    ConfirmationCancelled {
        at: DateTime<Utc>,
    },
    CommitStarted {
        workout_uid: Option<String>,
        exercise_count: usize,
        at: DateTime<Utc>,
    },
    WorkoutSaved {
        workout_uid: String,
        exercise_count: usize,
        at: DateTime<Utc>,
    },
    SaveFailed {
        message: String,
        workout_uid: Option<String>,
        at: DateTime<Utc>,
    },
    /// A persisted workout was loaded into the composer for editing.
    EditLoaded {
        workout_uid: String,
        exercise_count: usize,
        at: DateTime<Utc>,
    },
}
