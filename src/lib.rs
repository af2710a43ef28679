// Auth client - library root

pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;
pub mod http_client;
pub mod models;
pub mod storage;
pub mod store;
pub mod users;
