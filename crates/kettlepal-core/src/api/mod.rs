//! Persistence API boundary.
//!
//! The composer talks to the server only through [`WorkoutApi`], the subset
//! of the GraphQL contract a commit needs. [`GraphQlClient`] implements it
//! over HTTP and also exposes the rest of the schema (users, listing
//! queries, deletes).

mod client;
pub mod queries;
pub mod types;

pub use client::GraphQlClient;
pub use types::{
    AddExerciseInput, AddUserInput, EditExerciseInput, EditUserInput, EditWorkoutInput, Exercise, User,
    Workout, WorkoutInput,
};

use async_trait::async_trait;

use crate::error::ApiError;

#[async_trait]
pub trait WorkoutApi: Send + Sync {
    /// `workout(uid)`; `Ok(None)` when the server has no such workout.
    async fn workout(&self, uid: &str) -> Result<Option<Workout>, ApiError>;

    async fn add_workout(&self, user_uid: &str, input: &WorkoutInput) -> Result<Workout, ApiError>;

    async fn update_workout(&self, uid: &str, edits: &EditWorkoutInput) -> Result<Workout, ApiError>;

    async fn add_exercise(
        &self,
        workout_uid: &str,
        input: &AddExerciseInput,
    ) -> Result<Exercise, ApiError>;

    async fn update_exercise(
        &self,
        uid: &str,
        edits: &EditExerciseInput,
    ) -> Result<Exercise, ApiError>;

    /// Returns the remaining exercises, as the schema does.
    async fn delete_exercise(&self, uid: &str) -> Result<Vec<Exercise>, ApiError>;
}
