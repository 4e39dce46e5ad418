//! Workout log endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthenticatedUser;
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::validation::{Field, ObjectSchema, RequestInput, Source, Typed, Validated};

const TABLE: &str = "workouts";
const WORKOUT_TYPES: &[&str] = &["run", "ride", "swim", "strength", "yoga", "other"];

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateWorkout {
    pub name: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RequestInput for CreateWorkout {
    fn targets() -> &'static [Source] {
        &[Source::Body]
    }

    fn schema() -> Typed<Self> {
        Typed::new(
            ObjectSchema::new()
                .field("name", Field::string().min_len(1).max_len(100))
                .field("type", Field::one_of(WORKOUT_TYPES))
                .field("duration_minutes", Field::integer().min(1).max(1440))
                .field("notes", Field::string().max_len(1000).optional()),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ListWorkouts {
    pub limit: usize,
    pub offset: usize,
}

impl RequestInput for ListWorkouts {
    fn targets() -> &'static [Source] {
        &[Source::Query]
    }

    fn schema() -> Typed<Self> {
        Typed::new(
            ObjectSchema::new()
                .field("limit", Field::integer().min(1).max(100).default_value(20))
                .field("offset", Field::integer().min(0).default_value(0)),
        )
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateWorkout {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RequestInput for UpdateWorkout {
    // Path id must not be overridable from the body.
    fn targets() -> &'static [Source] {
        &[Source::Body, Source::Params]
    }

    fn schema() -> Typed<Self> {
        Typed::new(
            ObjectSchema::new()
                .field("id", Field::string().min_len(1))
                .field("name", Field::string().min_len(1).max_len(100).optional())
                .field("type", Field::one_of(WORKOUT_TYPES).optional())
                .field("duration_minutes", Field::integer().min(1).max(1440).optional())
                .field("notes", Field::string().max_len(1000).optional()),
        )
    }
}

fn to_row<T: Serialize>(input: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::Internal("workout did not serialize to an object".into())),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

pub async fn create_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Validated(input): Validated<CreateWorkout>,
) -> Result<(StatusCode, ApiResponse<Value>), ApiError> {
    let row = state.store.insert(TABLE, &user.id, to_row(&input)?).await?;
    tracing::info!(user = %user.id, id = %row["id"], "workout created");
    Ok((StatusCode::CREATED, ApiResponse::ok(row)))
}

pub async fn list_workouts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Validated(page): Validated<ListWorkouts>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let rows = state.store.list(TABLE, &user.id, page.limit, page.offset).await?;
    Ok(ApiResponse::ok(rows))
}

pub async fn update_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Validated(input): Validated<UpdateWorkout>,
) -> Result<ApiResponse<Value>, ApiError> {
    let patch = to_row(&input)?;
    state
        .store
        .update(TABLE, &input.id, &user.id, patch)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::NotFound(format!("workout {} not found", input.id)))
}
