//! GraphQlClient: reqwest-backed implementation of the persistence API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::queries;
use super::types::{
    AddExerciseInput, AddUserInput, EditExerciseInput, EditUserInput, EditWorkoutInput, Exercise, User,
    Workout, WorkoutInput,
};
use super::WorkoutApi;
use crate::error::ApiError;
use crate::storage::Config;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorBody>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for the Kettlepal GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    endpoint: Url,
    http_client: Client,
}

impl GraphQlClient {
    /// Create a client for `endpoint` with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint).map_err(|source| ApiError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(
            &config.api.endpoint,
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Transport ────────────────────────────────────────────────────

    /// Run one operation and pull `field` out of `data`. A `null` field
    /// comes back as `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        document: String,
        variables: Value,
        field: &str,
    ) -> Result<Option<T>, ApiError> {
        tracing::debug!(operation = field, endpoint = %self.endpoint, "graphql request");

        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;

        let body: GraphQlResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(err) = body.errors.and_then(|errs| errs.into_iter().next()) {
            tracing::debug!(operation = field, message = %err.message, "graphql error");
            return Err(ApiError::GraphQl {
                message: err.message,
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let mut data = body.data.ok_or_else(|| ApiError::MissingData {
            field: field.to_string(),
        })?;
        match data.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        document: String,
        variables: Value,
        field: &str,
    ) -> Result<T, ApiError> {
        self.fetch(document, variables, field)
            .await?
            .ok_or_else(|| ApiError::MissingData {
                field: field.to_string(),
            })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self
            .fetch(queries::users(), json!({}), "users")
            .await?
            .unwrap_or_default())
    }

    pub async fn user(&self, uid: &str) -> Result<Option<User>, ApiError> {
        self.fetch(queries::user(), json!({ "uid": uid }), "user").await
    }

    pub async fn workouts(&self) -> Result<Vec<Workout>, ApiError> {
        Ok(self
            .fetch(queries::workouts(), json!({}), "workouts")
            .await?
            .unwrap_or_default())
    }

    pub async fn exercises(&self) -> Result<Vec<Exercise>, ApiError> {
        Ok(self
            .fetch(queries::exercises(), json!({}), "exercises")
            .await?
            .unwrap_or_default())
    }

    pub async fn exercise(&self, uid: &str) -> Result<Option<Exercise>, ApiError> {
        self.fetch(queries::exercise(), json!({ "uid": uid }), "exercise")
            .await
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn add_user(&self, user: &AddUserInput) -> Result<User, ApiError> {
        self.execute(queries::add_user(), json!({ "user": user }), "addUser")
            .await
    }

    pub async fn update_user(&self, uid: &str, edits: &EditUserInput) -> Result<User, ApiError> {
        self.execute(
            queries::update_user(),
            json!({ "uid": uid, "edits": edits }),
            "updateUser",
        )
        .await
    }

    pub async fn delete_user(&self, uid: &str) -> Result<Vec<User>, ApiError> {
        self.execute(queries::delete_user(), json!({ "uid": uid }), "deleteUser")
            .await
    }

    pub async fn delete_workout(&self, uid: &str) -> Result<Vec<Workout>, ApiError> {
        self.execute(
            queries::delete_workout(),
            json!({ "uid": uid }),
            "deleteWorkout",
        )
        .await
    }
}

#[async_trait]
impl WorkoutApi for GraphQlClient {
    async fn workout(&self, uid: &str) -> Result<Option<Workout>, ApiError> {
        self.fetch(queries::workout(), json!({ "uid": uid }), "workout")
            .await
    }

    async fn add_workout(&self, user_uid: &str, input: &WorkoutInput) -> Result<Workout, ApiError> {
        self.execute(
            queries::add_workout(),
            json!({ "user_uid": user_uid, "workout": input }),
            "addWorkout",
        )
        .await
    }

    async fn update_workout(&self, uid: &str, edits: &EditWorkoutInput) -> Result<Workout, ApiError> {
        self.execute(
            queries::update_workout(),
            json!({ "uid": uid, "edits": edits }),
            "updateWorkout",
        )
        .await
    }

    async fn add_exercise(
        &self,
        workout_uid: &str,
        input: &AddExerciseInput,
    ) -> Result<Exercise, ApiError> {
        self.execute(
            queries::add_exercise(),
            json!({ "workout_uid": workout_uid, "exercise": input }),
            "addExercise",
        )
        .await
    }

    async fn update_exercise(
        &self,
        uid: &str,
        edits: &EditExerciseInput,
    ) -> Result<Exercise, ApiError> {
        self.execute(
            queries::update_exercise(),
            json!({ "uid": uid, "edits": edits }),
            "updateExercise",
        )
        .await
    }

    async fn delete_exercise(&self, uid: &str) -> Result<Vec<Exercise>, ApiError> {
        self.execute(
            queries::delete_exercise(),
            json!({ "uid": uid }),
            "deleteExercise",
        )
        .await
    }
}
