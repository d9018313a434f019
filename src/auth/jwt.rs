//! JWT token generation and validation
//!
//! HS256 tokens whose `username` claim is the caller identity every
//! habit operation is scoped to.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::HabitusError;

/// Fallback secret for dev mode only
const DEV_SECRET: &str = "dev-only-insecure-secret";

/// Default expiry used by the dev validator
const DEV_EXPIRY_SECONDS: u64 = 86400;

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller identity; owner of every habit this token can touch
    pub username: String,
    /// Account email
    pub email: String,
    /// Issued-at (unix seconds)
    pub iat: u64,
    /// Expiry (unix seconds)
    pub exp: u64,
}

/// Input for token generation
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub username: String,
    pub email: String,
}

/// Result of token verification
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

/// Issues and verifies HS256 tokens
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a validator with the given secret and expiry
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, HabitusError> {
        if secret.len() < 16 {
            return Err(HabitusError::Auth(
                "JWT secret must be at least 16 characters".into(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        })
    }

    /// Create a validator with the insecure dev secret
    pub fn new_dev() -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(DEV_SECRET.as_bytes()),
            decoding_key: DecodingKey::from_secret(DEV_SECRET.as_bytes()),
            expiry_seconds: DEV_EXPIRY_SECONDS,
        }
    }

    /// Generate a signed token for the given identity
    pub fn generate_token(&self, input: TokenInput) -> Result<String, HabitusError> {
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            username: input.username,
            email: input.email,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| HabitusError::Auth(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token's signature and expiry
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => TokenValidationResult {
                valid: true,
                claims: Some(data.claims),
                error: None,
            },
            Err(e) => TokenValidationResult {
                valid: false,
                claims: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
