//! Habit document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for habits
pub const HABIT_COLLECTION: &str = "habits";

/// Habit document stored in MongoDB
///
/// `created_at` is an ISO-8601 string so the owner listing can sort on it
/// lexicographically, and `username` is fixed at creation time. Neither
/// field is ever rewritten after insert.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HabitDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Habit title
    pub title: String,

    /// Habit body text
    pub body: String,

    /// Creation timestamp (ISO-8601, millisecond precision)
    pub created_at: String,

    /// Owning identity
    pub username: String,
}

impl HabitDoc {
    /// Create a new habit document
    pub fn new(title: String, body: String, created_at: String, username: String) -> Self {
        Self {
            _id: None,
            title,
            body,
            created_at,
            username,
        }
    }
}

impl IntoIndexes for HabitDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Compound index serving the owner listing (newest first)
            (
                doc! { "username": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("owner_created_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
