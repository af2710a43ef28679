// REST client for the Django auth endpoints

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AuthError, Result};
use crate::http_client::{build_request, HttpClient};
use crate::models::auth::{ProfilePatch, RefreshRequest, RegisterBody};
use crate::models::{
    AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, TokenValidation, User,
    UserUpdate,
};
use crate::storage::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Default REST base URL of the auth endpoints
pub const DEFAULT_AUTH_API_URL: &str = "http://localhost:8000/api/auth";

/// Auth API client
/// Issues login/register/refresh calls and owns the bearer token
pub struct AuthApi {
    /// Base URL, e.g. `http://localhost:8000/api/auth`
    base_url: String,

    /// Shared HTTP client
    http: HttpClient,

    /// Persistent token storage
    storage: Arc<dyn TokenStorage>,

    /// In-memory copy of the access token
    token: RwLock<Option<String>>,
}

impl AuthApi {
    pub fn new(base_url: impl Into<String>, http: HttpClient, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            storage,
            token: RwLock::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Cache the access token and persist it
    pub async fn set_token(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        self.storage.set(ACCESS_TOKEN_KEY, token)
    }

    /// Persist a full token pair
    pub async fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.set_token(access).await?;
        self.storage.set(REFRESH_TOKEN_KEY, refresh)
    }

    /// Current access token, loading it from storage on first use
    pub async fn token(&self) -> Result<Option<String>> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(Some(token.clone()));
        }

        let stored = self.storage.get(ACCESS_TOKEN_KEY)?;
        if let Some(ref token) = stored {
            *self.token.write().await = Some(token.clone());
        }
        Ok(stored)
    }

    /// Drop the access token from memory and storage
    pub async fn clear_token(&self) -> Result<()> {
        *self.token.write().await = None;
        self.storage.remove(ACCESS_TOKEN_KEY)
    }

    /// JSON content type plus a bearer header when a token is available
    pub async fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.token().await? {
            headers.insert(AUTHORIZATION, bearer(&token)?);
        }

        Ok(headers)
    }

    /// `POST /login/`, then fetch the profile with the new token
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        tracing::info!(email = %request.email, "Logging in");

        let builder = self
            .http
            .client()
            .post(self.endpoint("login/"))
            .headers(self.headers().await?)
            .json(request);
        let data: AuthResponse = self.http.execute_json(build_request(builder)?).await?;

        self.complete_authentication(data).await
    }

    /// `POST /register/`, then fetch the profile with the new token
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        tracing::info!(email = %request.email, "Registering account");

        let builder = self
            .http
            .client()
            .post(self.endpoint("register/"))
            .headers(self.headers().await?)
            .json(&RegisterBody::from(request));
        let data: AuthResponse = self.http.execute_json(build_request(builder)?).await?;

        self.complete_authentication(data).await
    }

    /// The profile fetch must start only after the new token is stored
    async fn complete_authentication(&self, mut data: AuthResponse) -> Result<AuthResponse> {
        self.set_token(&data.access).await?;

        let user = self.current_user().await?;
        tracing::info!(user_id = %user.id, "Authenticated");
        data.user = Some(user);

        Ok(data)
    }

    /// `GET /profile/`
    pub async fn current_user(&self) -> Result<User> {
        let builder = self.http.client().get(self.endpoint("profile/"));
        self.send_authorized(builder).await
    }

    /// Alias of [`AuthApi::current_user`]
    pub async fn profile(&self) -> Result<User> {
        self.current_user().await
    }

    /// `PATCH /profile/` with only the fields that are set
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User> {
        let builder = self
            .http
            .client()
            .patch(self.endpoint("profile/"))
            .json(&ProfilePatch::from(update));
        self.send_authorized(builder).await
    }

    /// Refresh using the stored refresh token.
    ///
    /// Fails with [`AuthError::MissingRefreshToken`] before any network
    /// call when none is stored.
    pub async fn refresh_token(&self) -> Result<RefreshResponse> {
        let refresh = self
            .storage
            .get(REFRESH_TOKEN_KEY)?
            .ok_or(AuthError::MissingRefreshToken)?;

        self.refresh_with(&refresh).await
    }

    /// `POST /token/refresh/` with an explicit refresh token
    pub async fn refresh_with(&self, refresh: &str) -> Result<RefreshResponse> {
        tracing::debug!("Refreshing access token...");

        let builder = self
            .http
            .client()
            .post(self.endpoint("token/refresh/"))
            .headers(self.headers().await?)
            .json(&RefreshRequest { refresh });
        let data: RefreshResponse = self.http.execute_json(build_request(builder)?).await?;

        self.set_token(&data.access).await?;
        if let Some(ref rotated) = data.refresh {
            self.storage.set(REFRESH_TOKEN_KEY, rotated)?;
        }

        tracing::info!("Access token refreshed");
        Ok(data)
    }

    /// Refresh and discard the payload
    pub async fn refresh_session(&self) -> Result<()> {
        self.refresh_token().await.map(|_| ())
    }

    /// Check the stored token against the profile endpoint.
    ///
    /// No token means invalid without a request. A 401/403 answer means
    /// invalid; every other failure is returned as an error.
    pub async fn validate_token(&self) -> Result<TokenValidation> {
        if self.token().await?.is_none() {
            tracing::debug!("No stored access token to validate");
            return Ok(TokenValidation::default());
        }

        match self.current_user().await {
            Ok(user) => Ok(TokenValidation {
                valid: true,
                user: Some(user),
            }),
            Err(e) if e.is_rejected_credentials() => {
                tracing::info!("Stored access token was rejected");
                Ok(TokenValidation::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Forget both tokens
    pub async fn logout(&self) -> Result<()> {
        self.clear_token().await?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Send with the current headers; on 401 refresh once and replay
    async fn send_authorized<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let request = build_request(builder.headers(self.headers().await?))?;
        let replay = request.try_clone();

        let err = match self.http.execute_json(request).await {
            Err(e) if e.is_unauthorized() => e,
            other => return other,
        };

        let Some(mut replay) = replay else {
            return Err(err);
        };
        if self.storage.get(REFRESH_TOKEN_KEY)?.is_none() {
            return Err(err);
        }

        tracing::warn!("Received 401, refreshing token and retrying...");
        let refreshed = self.refresh_token().await?;
        replay
            .headers_mut()
            .insert(AUTHORIZATION, bearer(&refreshed.access)?);

        self.http.execute_json(replay).await
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Invalid access token header: {}", e)))
}
