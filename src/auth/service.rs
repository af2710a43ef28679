// Seam between the stores and the network

use async_trait::async_trait;

use super::api::AuthApi;
use crate::error::Result;
use crate::models::{
    AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, TokenValidation, User,
};

/// Network operations the stores depend on
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    async fn current_user(&self) -> Result<User>;

    async fn refresh_with(&self, refresh_token: &str) -> Result<RefreshResponse>;

    async fn refresh_session(&self) -> Result<()>;

    async fn validate_token(&self) -> Result<TokenValidation>;

    async fn logout(&self) -> Result<()>;
}

#[async_trait]
impl AuthService for AuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        AuthApi::login(self, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        AuthApi::register(self, request).await
    }

    async fn current_user(&self) -> Result<User> {
        AuthApi::current_user(self).await
    }

    async fn refresh_with(&self, refresh_token: &str) -> Result<RefreshResponse> {
        AuthApi::refresh_with(self, refresh_token).await
    }

    async fn refresh_session(&self) -> Result<()> {
        AuthApi::refresh_session(self).await
    }

    async fn validate_token(&self) -> Result<TokenValidation> {
        AuthApi::validate_token(self).await
    }

    async fn logout(&self) -> Result<()> {
        AuthApi::logout(self).await
    }
}
