//! User document schema
//!
//! Stores account credentials and optional profile details.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Unique handle; recorded on every habit this user creates
    pub username: String,

    /// Contact address, unique
    pub email: String,

    /// Argon2 password hash (PHC format)
    pub password_hash: String,

    /// Signup timestamp (ISO-8601, millisecond precision)
    pub created_at: String,

    /// Optional profile details, merged by the detail-update route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(username: String, email: String, password_hash: String, created_at: String) -> Self {
        Self {
            _id: None,
            username,
            email,
            password_hash,
            created_at,
            bio: None,
            website: None,
            location: None,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on username
            (
                doc! { "username": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("username_unique".to_string())
                        .build(),
                ),
            ),
            // Unique index on email for login lookups
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
