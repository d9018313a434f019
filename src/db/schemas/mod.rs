//! Database schemas for habitus
//!
//! Defines MongoDB document structures for habits and users.

mod habit;
mod user;

pub use habit::{HabitDoc, HABIT_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
