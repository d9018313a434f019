//! Domain types for the habit service

use serde::Serialize;
use std::fmt;

/// A habit record with its store-assigned id attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub habit_id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub username: String,
}

/// Input for habit creation
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub title: String,
    pub body: String,
}

/// Partial field set for habit update
///
/// `habit_id` and `created_at` are immutable; their presence in a patch
/// is recorded so the guard can reject the edit. The rejection does not
/// stop the merge of the remaining fields (see the service).
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub habit_id: Option<String>,
    pub created_at: Option<String>,
}

impl HabitPatch {
    /// Whether the patch tries to edit immutable fields
    pub fn names_immutable_fields(&self) -> bool {
        self.habit_id.is_some() || self.created_at.is_some()
    }
}

/// Caller-visible outcome of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// All provided fields were mutable; the merge was persisted
    Applied,
    /// The patch named `habitId`/`createdAt`; the edit is reported as
    /// rejected while the remaining fields were still merged
    RejectedImmutableFields,
}

/// Typed failures of the habit service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitError {
    /// Caller input defect; `field` keys the error message
    Validation { field: &'static str },
    /// Referenced habit does not exist
    NotFound,
    /// Habit exists but the caller is not its owner
    Forbidden,
    /// Store malfunction; `code` carries the store error when the
    /// operation discloses it
    Internal { code: Option<String> },
}

impl fmt::Display for HabitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitError::Validation { field } => write!(f, "validation failed: {}", field),
            HabitError::NotFound => write!(f, "habit not found"),
            HabitError::Forbidden => write!(f, "caller is not the owner"),
            HabitError::Internal { code: Some(code) } => write!(f, "internal failure: {}", code),
            HabitError::Internal { code: None } => write!(f, "internal failure"),
        }
    }
}
