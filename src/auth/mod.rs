// Authentication module
// REST auth client, activity tracking and background session refresh

mod activity;
mod api;
mod keeper;
mod service;

pub use activity::{ActivityEvent, ActivityTracker, DEFAULT_ACTIVITY_WINDOW_SECS};
pub use api::{AuthApi, DEFAULT_AUTH_API_URL};
pub use keeper::SessionKeeper;
pub use service::AuthService;
