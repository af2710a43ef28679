// Token-holding auth store for the REST backend

use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::AuthService;
use crate::error::{AuthError, Result};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::storage::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Snapshot of the REST auth state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub loading: bool,
    /// Message for the last failed login/register
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Auth store that keeps both tokens and mirrors them into storage.
///
/// Every mutation publishes a new [`AuthState`] to subscribers. Concurrent
/// actions are not serialized: whichever finishes last wins.
pub struct AuthStore {
    service: Arc<dyn AuthService>,
    storage: Arc<dyn TokenStorage>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    /// Create a store seeded with whatever tokens are already persisted
    pub fn new(service: Arc<dyn AuthService>, storage: Arc<dyn TokenStorage>) -> Result<Self> {
        let initial = AuthState {
            access_token: storage.get(ACCESS_TOKEN_KEY)?,
            refresh_token: storage.get(REFRESH_TOKEN_KEY)?,
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);

        Ok(Self {
            service,
            storage,
            state,
        })
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Store both tokens in state and storage
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.state.send_modify(|s| {
            s.access_token = Some(access.to_string());
            s.refresh_token = Some(refresh.to_string());
        });
        self.storage.set(ACCESS_TOKEN_KEY, access)?;
        self.storage.set(REFRESH_TOKEN_KEY, refresh)
    }

    /// Remove both tokens from state and storage
    pub fn clear_tokens(&self) -> Result<()> {
        self.state.send_modify(|s| {
            s.access_token = None;
            s.refresh_token = None;
        });
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)
    }

    /// Publish the tokens storage holds right now.
    ///
    /// The API layer writes storage on its own (the access token before the
    /// profile fetch, refreshed pairs on a 401 replay), so every service
    /// call is followed by this.
    fn sync_tokens(&self) -> Result<()> {
        let access = self.storage.get(ACCESS_TOKEN_KEY)?;
        let refresh = self.storage.get(REFRESH_TOKEN_KEY)?;

        self.state.send_if_modified(|s| {
            let changed = s.access_token != access || s.refresh_token != refresh;
            s.access_token = access;
            s.refresh_token = refresh;
            changed
        });
        Ok(())
    }

    /// Re-read storage after a service call; the call's own error wins
    fn synced<T>(&self, result: Result<T>) -> Result<T> {
        match (result, self.sync_tokens()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), synced) => {
                if let Err(sync_err) = synced {
                    tracing::warn!("Failed to re-read stored tokens: {}", sync_err);
                }
                Err(e)
            }
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.begin();
        let result = self.service.register(request).await;
        self.finish(result, "Registration failed")
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.begin();
        let result = self.service.login(request).await;
        self.finish(result, "Login failed")
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(&self, result: Result<AuthResponse>, fallback: &str) -> Result<AuthResponse> {
        let outcome = self.synced(result).and_then(|response| {
            self.set_tokens(&response.access, &response.refresh)?;
            self.state.send_modify(|s| s.user = response.user.clone());
            Ok(response)
        });

        let error = outcome.as_ref().err().map(|e| {
            let message = e.server_message().unwrap_or_else(|| fallback.to_string());
            tracing::warn!(error = %e, "{}", message);
            message
        });

        self.state.send_modify(|s| {
            if error.is_some() {
                s.error = error;
            }
            s.loading = false;
        });

        outcome
    }

    /// Drop tokens and user, whatever the current state
    pub async fn logout(&self) -> Result<()> {
        self.clear_tokens()?;
        self.state.send_modify(|s| s.user = None);
        self.service.logout().await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Without a refresh token this fails before touching the network.
    /// A failed refresh clears both tokens.
    pub async fn refresh_access_token(&self) -> Result<String> {
        self.sync_tokens()?;
        let refresh = self
            .state
            .borrow()
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        match self.service.refresh_with(&refresh).await {
            Ok(response) => {
                self.storage.set(ACCESS_TOKEN_KEY, &response.access)?;
                if let Some(ref rotated) = response.refresh {
                    self.storage.set(REFRESH_TOKEN_KEY, rotated)?;
                }
                self.sync_tokens()?;
                Ok(response.access)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, clearing tokens: {}", e);
                self.clear_tokens()?;
                self.service.logout().await?;
                Err(e)
            }
        }
    }

    /// Load the profile into state; a failure clears the user
    pub async fn fetch_profile(&self) -> Result<User> {
        let result = self.service.current_user().await;
        match self.synced(result) {
            Ok(user) => {
                self.state.send_modify(|s| s.user = Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.state.send_modify(|s| s.user = None);
                Err(e)
            }
        }
    }
}
