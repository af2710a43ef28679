// Root store: app-wide view over the session store

use std::sync::Arc;
use tokio::sync::watch;

use super::session_store::SessionStore;
use crate::auth::AuthService;
use crate::models::{TokenValidation, User};

/// App-level flags that are not part of the session itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainState {
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Facade over [`SessionStore`] plus app startup
pub struct MainStore {
    service: Arc<dyn AuthService>,
    auth: Arc<SessionStore>,
    state: watch::Sender<MainState>,
}

impl MainStore {
    pub fn new(service: Arc<dyn AuthService>, auth: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(MainState::default());
        Self {
            service,
            auth,
            state,
        }
    }

    pub fn auth_store(&self) -> &Arc<SessionStore> {
        &self.auth
    }

    pub fn subscribe(&self) -> watch::Receiver<MainState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.auth.user()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Validate the stored token at startup; anything but a valid token
    /// with a user signs out. Returns the resulting auth flag.
    pub async fn initialize_auth(&self) -> bool {
        match self.service.validate_token().await {
            Ok(TokenValidation {
                valid: true,
                user: Some(user),
            }) => {
                self.set_user(Some(user));
                self.set_auth(true);
            }
            Ok(_) => {
                tracing::info!("No valid stored session");
                self.logout();
            }
            Err(e) => {
                tracing::warn!("Auth initialization failed: {}", e);
                self.logout();
            }
        }

        self.is_authenticated()
    }

    pub fn set_auth(&self, value: bool) {
        self.auth.set_auth_state(value, self.user());
    }

    /// Setting a user also marks the session authenticated
    pub fn set_user(&self, user: Option<User>) {
        match user {
            Some(user) => self.auth.set_auth_state(true, Some(user)),
            None => self.auth.set_auth_state(self.auth.is_authenticated(), None),
        }
    }

    pub fn set_loading(&self, value: bool) {
        self.state.send_modify(|s| s.is_loading = value);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|s| s.error = error);
    }

    pub fn logout(&self) {
        self.auth.logout();
        self.set_auth(false);
        self.set_user(None);
        self.set_error(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::store::test_support::{user, ScriptedService};

    fn main_store(service: Arc<ScriptedService>) -> MainStore {
        let auth = Arc::new(SessionStore::new(service.clone()));
        MainStore::new(service, auth)
    }

    #[tokio::test]
    async fn test_initialize_with_valid_token() {
        let service = Arc::new(ScriptedService::default());
        service.push_validation(Ok(TokenValidation {
            valid: true,
            user: Some(user(1)),
        }));
        let store = main_store(service);

        assert!(store.initialize_auth().await);
        assert_eq!(store.user(), Some(user(1)));
        assert!(store.auth_store().is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_valid_without_user_signs_out() {
        let service = Arc::new(ScriptedService::default());
        service.push_validation(Ok(TokenValidation {
            valid: true,
            user: None,
        }));
        let store = main_store(service);
        store.set_user(Some(user(2)));

        assert!(!store.initialize_auth().await);
        assert_eq!(store.user(), None);
    }

    #[tokio::test]
    async fn test_initialize_error_signs_out_and_clears_error() {
        let service = Arc::new(ScriptedService::default());
        service.push_validation(Err(AuthError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        }));
        let store = main_store(service);
        store.set_user(Some(user(3)));
        store.set_error(Some("stale".to_string()));

        assert!(!store.initialize_auth().await);
        assert!(!store.is_authenticated());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_set_user_marks_authenticated() {
        let store = main_store(Arc::new(ScriptedService::default()));
        store.set_user(Some(user(5)));
        assert!(store.is_authenticated());

        // Clearing the user leaves the flag alone
        store.set_user(None);
        assert!(store.is_authenticated());
        assert_eq!(store.user(), None);

        store.set_auth(false);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_loading_and_error_flags() {
        let store = main_store(Arc::new(ScriptedService::default()));
        let updates = store.subscribe();

        store.set_loading(true);
        store.set_error(Some("Login failed".to_string()));
        assert!(store.is_loading());
        assert_eq!(store.error().as_deref(), Some("Login failed"));
        assert!(updates.has_changed().unwrap());
    }
}
