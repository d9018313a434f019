//! HTTP routes for user accounts
//!
//! - POST /signup - create an account and get a token
//! - POST /login  - authenticate and get a token
//! - GET  /user   - current user's details
//! - POST /user   - merge profile details into the current user
//!
//! Signup and login are the only unauthenticated routes in the API.

use bson::doc;
use chrono::{SecondsFormat, Utc};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, TokenInput};
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::MongoCollection;
use crate::server::AppState;

use super::guard::{
    error_response, field_error_response, get_jwt_validator, json_response, parse_json_body,
    require_identity, FullBody, MessageResponse,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Stored user minus the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    pub username: String,
    pub email: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<UserDoc> for UserCredentials {
    fn from(user: UserDoc) -> Self {
        Self {
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            bio: user.bio,
            website: user.website,
            location: user.location,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub credentials: UserCredentials,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Minimal shape check; uniqueness is what actually matters
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Open the users collection, or produce the refusal the client sees
async fn users_collection(
    state: &AppState,
) -> Result<MongoCollection<UserDoc>, Response<FullBody>> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database not available",
            ))
        }
    };

    mongo.collection::<UserDoc>(USER_COLLECTION).await.map_err(|e| {
        warn!("Error opening users collection: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /signup
///
/// Flow:
/// 1. Validate the input shape (ordered, first failure wins)
/// 2. Check username and email are free
/// 3. Hash the password with argon2
/// 4. Store the account and issue a JWT
pub async fn handle_signup(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: SignupRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
        }
    };

    if body.email.trim().is_empty() {
        return field_error_response("email", "Must not be empty");
    }
    if !is_valid_email(&body.email) {
        return field_error_response("email", "Must be a valid email address");
    }
    if body.password.is_empty() {
        return field_error_response("password", "Must not be empty");
    }
    if body.password != body.confirm_password {
        return field_error_response("confirmPassword", "Passwords must match");
    }
    if body.username.trim().is_empty() {
        return field_error_response("username", "Must not be empty");
    }

    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };

    let collection = match users_collection(&state).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    // Check the handle and address are free before hashing
    match collection.find_one(doc! { "username": &body.username }).await {
        Ok(Some(_)) => {
            return field_error_response("username", "this username is already taken")
        }
        Ok(None) => {}
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    }
    match collection.find_one(doc! { "email": &body.email }).await {
        Ok(Some(_)) => return field_error_response("email", "Email is already in use"),
        Ok(None) => {}
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            warn!("Failed to hash password: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong");
        }
    };

    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let user = UserDoc::new(
        body.username.clone(),
        body.email.clone(),
        password_hash,
        created_at,
    );

    if let Err(e) = collection.insert_one(user).await {
        // Unique index race: another signup with the same handle won
        let error_str = e.to_string();
        if error_str.contains("duplicate key") || error_str.contains("E11000") {
            return field_error_response("username", "this username is already taken");
        }
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &error_str);
    }

    info!("Registered new user: {}", body.username);

    match jwt.generate_token(TokenInput {
        username: body.username,
        email: body.email,
    }) {
        Ok(token) => json_response(StatusCode::CREATED, &TokenResponse { token }),
        Err(e) => {
            warn!("Failed to generate token: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
        }
    }
}

/// POST /login
pub async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
        }
    };

    if body.email.is_empty() {
        return field_error_response("email", "Must not be empty");
    }
    if body.password.is_empty() {
        return field_error_response("password", "Must not be empty");
    }

    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };

    let collection = match users_collection(&state).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let user = match collection.find_one(doc! { "email": &body.email }).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            // Same refusal for unknown address and wrong password
            return wrong_credentials_response();
        }
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return wrong_credentials_response(),
        Err(e) => {
            warn!("Password verification failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong");
        }
    }

    match jwt.generate_token(TokenInput {
        username: user.username,
        email: user.email,
    }) {
        Ok(token) => json_response(StatusCode::OK, &TokenResponse { token }),
        Err(e) => {
            warn!("Failed to generate token: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
        }
    }
}

/// 403 with the wrong-credentials body both login failures share
fn wrong_credentials_response() -> Response<FullBody> {
    let mut body = serde_json::Map::new();
    body.insert(
        "general".to_string(),
        serde_json::Value::String("Wrong credentials, please try again".to_string()),
    );
    json_response(StatusCode::FORBIDDEN, &serde_json::Value::Object(body))
}

/// GET /user
pub async fn handle_user_detail(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let collection = match users_collection(&state).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match collection.find_one(doc! { "username": &claims.username }).await {
        Ok(Some(user)) => json_response(
            StatusCode::OK,
            &UserDetailResponse {
                credentials: user.into(),
            },
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// POST /user
///
/// Merges the provided profile fields into the caller's account; fields
/// not present are left untouched.
pub async fn handle_update_user_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<FullBody> {
    let claims = match require_identity(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: UpdateDetailsRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", e))
        }
    };

    let collection = match users_collection(&state).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let mut set = bson::Document::new();
    if let Some(bio) = body.bio {
        set.insert("bio", bio);
    }
    if let Some(website) = body.website {
        set.insert("website", website);
    }
    if let Some(location) = body.location {
        set.insert("location", location);
    }

    if !set.is_empty() {
        if let Err(e) = collection
            .update_one(doc! { "username": &claims.username }, doc! { "$set": set })
            .await
        {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    }

    json_response(
        StatusCode::OK,
        &MessageResponse {
            message: "Details added successfully".to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b@sub.example.co"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@nodots"));
        assert!(!is_valid_email("alice@.com"));
        assert!(!is_valid_email("alice@example."));
    }

    #[test]
    fn credentials_omit_password_hash() {
        let user = UserDoc::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$argon2id$secret".to_string(),
            "2026-01-01T00:00:00.000Z".to_string(),
        );
        let value = serde_json::to_value(UserCredentials::from(user)).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00.000Z");
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }
}
