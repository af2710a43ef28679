// Scripted AuthService for store tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::auth::AuthService;
use crate::error::{AuthError, Result};
use crate::models::{
    AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, TokenValidation, User, UserId,
};

pub fn user(id: i64) -> User {
    User {
        id: UserId::Int(id),
        email: format!("user{}@example.com", id),
        first_name: Some("Test".to_string()),
        last_name: Some(format!("User{}", id)),
    }
}

enum Scripted<T> {
    Ready(Result<T>),
    Gated(Gate, T),
}

struct Gate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Test-side handles of a gated login
pub struct LoginGate {
    /// Fires once the call has taken its scripted response
    pub started: oneshot::Receiver<()>,
    /// Lets the call resolve
    pub release: oneshot::Sender<()>,
}

/// Answers each call with the next queued result
#[derive(Default)]
pub struct ScriptedService {
    logins: Mutex<VecDeque<Scripted<AuthResponse>>>,
    registers: Mutex<VecDeque<Result<AuthResponse>>>,
    current_users: Mutex<VecDeque<Result<User>>>,
    refreshes: Mutex<VecDeque<Result<RefreshResponse>>>,
    session_refreshes: Mutex<VecDeque<Result<()>>>,
    validations: Mutex<VecDeque<Result<TokenValidation>>>,
    refreshed_with: Mutex<Vec<String>>,
    session_refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

fn exhausted(op: &str) -> AuthError {
    AuthError::Internal(anyhow::anyhow!("no scripted response for {}", op))
}

impl ScriptedService {
    pub fn push_login(&self, result: Result<AuthResponse>) {
        self.logins.lock().unwrap().push_back(Scripted::Ready(result));
    }

    /// Queue a login that resolves only when the gate is released
    pub fn push_gated_login(&self, response: AuthResponse) -> LoginGate {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let gate = Gate {
            started: started_tx,
            release: release_rx,
        };
        self.logins
            .lock()
            .unwrap()
            .push_back(Scripted::Gated(gate, response));

        LoginGate {
            started: started_rx,
            release: release_tx,
        }
    }

    pub fn push_register(&self, result: Result<AuthResponse>) {
        self.registers.lock().unwrap().push_back(result);
    }

    pub fn push_current_user(&self, result: Result<User>) {
        self.current_users.lock().unwrap().push_back(result);
    }

    pub fn push_refresh(&self, result: Result<RefreshResponse>) {
        self.refreshes.lock().unwrap().push_back(result);
    }

    pub fn push_session_refresh(&self, result: Result<()>) {
        self.session_refreshes.lock().unwrap().push_back(result);
    }

    pub fn push_validation(&self, result: Result<TokenValidation>) {
        self.validations.lock().unwrap().push_back(result);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refreshed_with.lock().unwrap().len()
    }

    pub fn refreshed_with(&self) -> Vec<String> {
        self.refreshed_with.lock().unwrap().clone()
    }

    pub fn session_refresh_calls(&self) -> usize {
        self.session_refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthService for ScriptedService {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse> {
        let next = self.logins.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Gated(gate, response)) => {
                let _ = gate.started.send(());
                let _ = gate.release.await;
                Ok(response)
            }
            None => Err(exhausted("login")),
        }
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse> {
        let next = self.registers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("register")))
    }

    async fn current_user(&self) -> Result<User> {
        let next = self.current_users.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("current_user")))
    }

    async fn refresh_with(&self, refresh_token: &str) -> Result<RefreshResponse> {
        self.refreshed_with
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        let next = self.refreshes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("refresh_with")))
    }

    async fn refresh_session(&self) -> Result<()> {
        self.session_refresh_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.session_refreshes.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn validate_token(&self) -> Result<TokenValidation> {
        let next = self.validations.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("validate_token")))
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
