//! HTTP routes for habits
//!
//! Transport adapter over the habit service:
//! - GET    /habits          - list the caller's habits
//! - GET    /habit/:habitId  - fetch one habit
//! - POST   /habit           - create a habit
//! - POST   /habit/:habitId  - merge fields into a habit
//! - DELETE /habit/:habitId  - delete a habit
//!
//! Handlers resolve the caller identity, parse the input shape, invoke
//! one service operation, and map its typed result to status + JSON.

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::habits::{self, Habit, HabitError, HabitPatch, MongoHabitStore, NewHabit, UpdateOutcome};
use crate::server::AppState;

use super::guard::{
    error_response, field_error_response, json_response, parse_json_body, require_identity,
    ErrorResponse, FullBody, MessageResponse,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditHabitRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub habit_id: Option<String>,
    pub created_at: Option<String>,
}

/// Created habit on the wire. The fresh id is keyed `id` here, while
/// list/get responses carry it as `habitId`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedHabitResponse {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub username: String,
}

impl From<Habit> for CreatedHabitResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.habit_id,
            title: habit.title,
            body: habit.body,
            created_at: habit.created_at,
            username: habit.username,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map a service failure to its HTTP rendering
fn habit_error_response(err: HabitError) -> Response<FullBody> {
    match err {
        HabitError::Validation { field } => field_error_response(field, "Must not be empty"),
        HabitError::NotFound => error_response(StatusCode::NOT_FOUND, "Habit not found"),
        HabitError::Forbidden => error_response(StatusCode::FORBIDDEN, "UnAuthorized"),
        HabitError::Internal { code } => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: code.unwrap_or_else(|| "Something went wrong".to_string()),
            },
        ),
    }
}

/// Open the habits store, or produce the refusal the client sees
async fn habit_store(state: &AppState) -> Result<MongoHabitStore, Response<FullBody>> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database not available",
            ))
        }
    };

    MongoHabitStore::new(mongo).await.map_err(|e| {
        warn!("Error opening habits collection: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /habits
pub async fn handle_list_habits(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let store = match habit_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match habits::list_mine(&store, &claims.username).await {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(err) => habit_error_response(err),
    }
}

/// GET /habit/:habitId
pub async fn handle_get_habit(
    req: Request<Incoming>,
    state: Arc<AppState>,
    habit_id: &str,
) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let store = match habit_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match habits::get_one(&store, habit_id, &claims.username).await {
        Ok(habit) => json_response(StatusCode::OK, &habit),
        Err(err) => habit_error_response(err),
    }
}

/// POST /habit
pub async fn handle_create_habit(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateHabitRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
        }
    };

    let store = match habit_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let input = NewHabit {
        title: body.title,
        body: body.body,
    };

    match habits::create(&store, &claims.username, input).await {
        Ok(habit) => json_response(StatusCode::OK, &CreatedHabitResponse::from(habit)),
        Err(err) => habit_error_response(err),
    }
}

/// POST /habit/:habitId
///
/// Identity is resolved (the route is protected) but ownership is not
/// verified before the merge.
pub async fn handle_update_habit(
    req: Request<Incoming>,
    state: Arc<AppState>,
    habit_id: &str,
) -> Response<FullBody> {
    if let Err(resp) = require_identity(&req, &state) {
        return resp;
    }

    let body: EditHabitRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
        }
    };

    let store = match habit_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let patch = HabitPatch {
        title: body.title,
        body: body.body,
        habit_id: body.habit_id,
        created_at: body.created_at,
    };

    match habits::update(&store, habit_id, patch).await {
        Ok(UpdateOutcome::Applied) => json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Updated successfully".to_string(),
            },
        ),
        Ok(UpdateOutcome::RejectedImmutableFields) => json_response(
            StatusCode::FORBIDDEN,
            &MessageResponse {
                message: "Not allowed to edit".to_string(),
            },
        ),
        Err(err) => habit_error_response(err),
    }
}

/// DELETE /habit/:habitId
pub async fn handle_delete_habit(
    req: Request<Incoming>,
    state: Arc<AppState>,
    habit_id: &str,
) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let store = match habit_store(&state).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match habits::delete(&store, habit_id, &claims.username).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Delete successful".to_string(),
            },
        ),
        Err(err) => habit_error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<FullBody>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_field_keyed_400() {
        let resp = habit_error_response(HabitError::Validation { field: "body" });
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["body"], "Must not be empty");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let resp = habit_error_response(HabitError::NotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "Habit not found");
    }

    #[tokio::test]
    async fn forbidden_maps_to_403() {
        let resp = habit_error_response(HabitError::Forbidden);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["error"], "UnAuthorized");
    }

    #[tokio::test]
    async fn internal_without_code_is_generic() {
        let resp = habit_error_response(HabitError::Internal { code: None });
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Something went wrong");
    }

    #[tokio::test]
    async fn internal_with_code_passes_it_through() {
        let resp = habit_error_response(HabitError::Internal {
            code: Some("database error: find failed".to_string()),
        });
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "database error: find failed");
    }

    #[test]
    fn created_response_renames_id() {
        let habit = Habit {
            habit_id: "abc123".to_string(),
            title: "Run".to_string(),
            body: "5k".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            username: "alice".to_string(),
        };
        let value = serde_json::to_value(CreatedHabitResponse::from(habit)).unwrap();
        assert_eq!(value["id"], "abc123");
        assert!(value.get("habitId").is_none());
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00.000Z");
    }
}
