mod commit;
mod controller;
mod draft;
mod slots;

pub use commit::{
    run_commit, CommitError, CommitPlan, CommitProgress, CommitReceipt, CommitStage,
    PlannedExercise, WorkoutTarget, GENERIC_SAVE_ERROR,
};
pub use controller::{Composer, ComposerState, Outcome, SaveRequest, Trigger};
pub use draft::{
    parse_timestamp, ExerciseDraft, ExerciseEdit, ExerciseField, WeightUnit, WorkoutDraft,
    WorkoutEdit,
};
pub use slots::{Slot, SlotKey, SlotStore};
