// Data models for the auth and user APIs

pub mod auth;
pub mod user;

pub use auth::{
    AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, TokenPair, TokenValidation,
};
pub use user::{User, UserId, UserUpdate};
