//! HTTP routes for habitus

pub mod guard;
pub mod habit_routes;
pub mod health;
pub mod user_routes;

pub use habit_routes::{
    handle_create_habit, handle_delete_habit, handle_get_habit, handle_list_habits,
    handle_update_habit,
};
pub use health::{health_check, version_info};
pub use user_routes::{
    handle_login, handle_signup, handle_update_user_details, handle_user_detail,
};
