//! Shared request helpers for the route modules
//!
//! Caller identity is resolved here, before any habit service operation
//! runs: the bearer token is verified and its `username` claim becomes
//! the identity every operation is scoped to.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_token_from_header, Claims, JwtValidator};
use crate::server::AppState;
use crate::types::HabitusError;

pub type FullBody = Full<Bytes>;

/// Error body with a single `error` key
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Acknowledgment body with a single `message` key
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

pub fn error_response(status: StatusCode, error: &str) -> Response<FullBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.to_string(),
        },
    )
}

/// 400 with a field-keyed message, e.g. `{"body": "Must not be empty"}`
pub fn field_error_response(field: &str, message: &str) -> Response<FullBody> {
    let mut body = serde_json::Map::new();
    body.insert(
        field.to_string(),
        serde_json::Value::String(message.to_string()),
    );
    json_response(StatusCode::BAD_REQUEST, &serde_json::Value::Object(body))
}

pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, HabitusError> {
    let body = req
        .collect()
        .await
        .map_err(|e| HabitusError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(HabitusError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| HabitusError::Http(format!("Invalid JSON: {}", e)))
}

pub fn get_auth_header(req: &Request<Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

#[allow(clippy::result_large_err)]
pub fn get_jwt_validator(state: &AppState) -> Result<JwtValidator, Response<FullBody>> {
    if state.args.dev_mode {
        Ok(JwtValidator::new_dev())
    } else {
        match &state.args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), state.args.jwt_expiry_seconds)
                .map_err(|e| {
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &format!("JWT configuration error: {}", e),
                    )
                }),
            None => Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication not enabled (missing JWT_SECRET)",
            )),
        }
    }
}

/// Resolve the caller identity from the request, or produce the refusal
/// the client sees. Every protected route calls this before touching
/// the store.
#[allow(clippy::result_large_err)]
pub fn require_identity(
    req: &Request<Incoming>,
    state: &AppState,
) -> Result<Claims, Response<FullBody>> {
    let token = match extract_token_from_header(get_auth_header(req)) {
        Some(t) => t,
        None => return Err(error_response(StatusCode::FORBIDDEN, "UnAuthorized")),
    };

    let jwt = get_jwt_validator(state)?;
    let result = jwt.verify_token(token);

    if !result.valid {
        return Err(error_response(StatusCode::FORBIDDEN, "UnAuthorized"));
    }

    Ok(result.claims.unwrap())
}
