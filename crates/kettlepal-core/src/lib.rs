//! # Kettlepal Core Library
//!
//! Business logic for logging workouts against the Kettlepal GraphQL API.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Composer**: the form lifecycle of one workout (an explicit state
//!   machine over draft, timer and commit)
//! - **Slots**: ordered exercise drafts addressed by stable keys
//! - **Validation**: pure draft -> violations functions
//! - **Timer**: a Tokio-driven session stopwatch
//! - **API**: the [`WorkoutApi`] seam and its GraphQL client
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Composer`]: workout composition controller
//! - [`SessionTimer`]: elapsed session time
//! - [`GraphQlClient`]: persistence over HTTP
//! - [`Config`]: application configuration management

pub mod api;
pub mod compose;
pub mod error;
pub mod events;
pub mod storage;
pub mod summary;
pub mod timer;
pub mod validation;

pub use api::{Exercise, GraphQlClient, User, Workout, WorkoutApi};
pub use compose::{
    Composer, ComposerState, ExerciseDraft, ExerciseEdit, SlotKey, WeightUnit, WorkoutDraft,
    WorkoutEdit,
};
pub use error::{ApiError, ComposeError, ConfigError, CoreError};
pub use events::Event;
pub use storage::Config;
pub use summary::Confirmation;
pub use timer::{SessionTimer, TimerState};
pub use validation::{Located, Violation};
