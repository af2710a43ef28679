// State stores
// Token store for the REST backend, session store for the GraphQL backend,
// and the root store composing the session store into app-wide getters

mod auth_store;
mod main_store;
mod session_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_store::{AuthState, AuthStore};
pub use main_store::{MainState, MainStore};
pub use session_store::{SessionState, SessionStore};
