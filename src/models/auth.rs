// Auth request and response payloads

use serde::{Deserialize, Serialize};

use super::user::{User, UserUpdate};

/// Credentials for `POST /login/`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// New account details for `POST /register/`
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Wire body for registration; the backend wants the password twice
#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub password2: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

impl<'a> From<&'a RegisterRequest> for RegisterBody<'a> {
    fn from(req: &'a RegisterRequest) -> Self {
        Self {
            email: &req.email,
            password: &req.password,
            password2: &req.password,
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
        }
    }
}

/// Token pair plus the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /token/refresh/` body
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// `POST /token/refresh/` response; `refresh` is present when rotation is on
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// GraphQL `login` mutation result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Outcome of checking the stored token against the backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: Option<User>,
}

/// Wire body for `PATCH /profile/`
#[derive(Debug, Serialize)]
pub(crate) struct ProfilePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
}

impl<'a> From<&'a UserUpdate> for ProfilePatch<'a> {
    fn from(update: &'a UserUpdate) -> Self {
        Self {
            email: update.email.as_deref(),
            first_name: update.first_name.as_deref(),
            last_name: update.last_name.as_deref(),
        }
    }
}
