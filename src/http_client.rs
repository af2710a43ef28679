use anyhow::Context;
use reqwest::{Client, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{AuthError, Result};

/// Shared HTTP client for the auth and GraphQL endpoints
#[derive(Clone)]
pub struct HttpClient {
    /// Pooled reqwest client
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Execute a request once.
    ///
    /// Non-2xx responses become [`AuthError::Http`] carrying the raw body.
    /// No retries happen here; callers decide whether a failure is
    /// worth a refresh-and-replay.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(method = %method, url = %url, "Sending HTTP request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let kind = error_kind(&e);
                tracing::warn!(
                    error_kind = kind,
                    error = %e,
                    url = %url,
                    "HTTP request error"
                );
                return Err(AuthError::Transport { kind, source: e });
            }
        };

        let status = response.status();
        tracing::debug!(status = %status, "Received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let body = error_body(status.as_u16(), response.text().await);
        tracing::warn!(
            status = status.as_u16(),
            url = %url,
            response_body = %body,
            "HTTP request failed with error response"
        );

        Err(AuthError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// Execute a request and decode the JSON body
    pub async fn execute_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.execute(request).await?;
        read_json(response).await
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Finish a request builder, reporting invalid URLs or bodies as transport errors
pub fn build_request(builder: RequestBuilder) -> Result<Request> {
    builder.build().map_err(|e| AuthError::Transport {
        kind: "request_error",
        source: e,
    })
}

/// Read a response body as JSON
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await.map_err(|e| AuthError::Transport {
        kind: error_kind(&e),
        source: e,
    })?;

    Ok(serde_json::from_str(&body)?)
}

/// Body of an error response; a failed read is logged and yields an empty body
fn error_body(status: u16, read: reqwest::Result<String>) -> String {
    match read {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                status = status,
                error_kind = error_kind(&e),
                error = %e,
                "Failed to read error response body"
            );
            String::new()
        }
    }
}

/// Categorize a transport error for logging
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
