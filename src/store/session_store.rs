// Session-flag auth store for the GraphQL backend

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::AuthService;
use crate::error::Result;
use crate::models::User;

/// Snapshot of the session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

/// Auth store tracking only "signed in" and the current user
pub struct SessionStore {
    service: Arc<dyn AuthService>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { service, state }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn set_auth_state(&self, is_authenticated: bool, user: Option<User>) {
        self.state.send_replace(SessionState {
            is_authenticated,
            user,
        });
    }

    pub fn login(&self, user: User) {
        self.set_auth_state(true, Some(user));
    }

    pub fn logout(&self) {
        self.set_auth_state(false, None);
    }

    /// Confirm the stored credentials by fetching the current user.
    /// Any failure signs the session out.
    pub async fn validate_stored_auth(&self) -> bool {
        match self.service.current_user().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Stored session is valid");
                self.login(user);
                true
            }
            Err(e) => {
                tracing::error!("Error validating session: {}", e);
                self.logout();
                false
            }
        }
    }

    /// Run `operation`, refreshing the session and retrying exactly once
    /// when it fails with an error mentioning "session".
    ///
    /// Other errors, a failed refresh, and a second failure are returned
    /// unchanged.
    pub async fn with_session_refresh<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match operation().await {
            Err(e) if e.is_session_error() => {
                tracing::info!("Session error ({}), refreshing and retrying once", e);
                self.service.refresh_session().await?;
                operation().await
            }
            other => other,
        }
    }
}
