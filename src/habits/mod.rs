//! Habit service
//!
//! The ownership-scoped CRUD core: five operations over an injected
//! [`HabitStore`], each producing a domain result or a typed
//! [`HabitError`]. The HTTP layer maps those to statuses; nothing in
//! here knows about requests or responses.

pub mod service;
pub mod store;
pub mod types;

pub use service::{create, delete, get_one, list_mine, update};
pub use store::{HabitStore, MongoHabitStore};
pub use types::{Habit, HabitError, HabitPatch, NewHabit, UpdateOutcome};
