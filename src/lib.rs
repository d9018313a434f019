//! habitus - habit tracking API
//!
//! Ownership-scoped CRUD over a MongoDB document store. Each habit is
//! owned by exactly one user; the habit service validates input,
//! enforces per-record ownership, and maps store state to typed
//! results that the HTTP layer renders as status + JSON.
//!
//! ## Components
//!
//! - **habits**: the service core (five operations over an injected store)
//! - **auth**: JWT issue/verify and argon2 password hashing
//! - **db**: MongoDB client, typed collections, document schemas
//! - **routes**: transport adapters for habits, users, and health
//! - **server**: hyper http1 listener and request routing

pub mod auth;
pub mod config;
pub mod db;
pub mod habits;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HabitusError, Result};
