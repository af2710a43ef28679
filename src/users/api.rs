// GraphQL client for user queries and mutations

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::auth::AuthApi;
use crate::error::Result;
use crate::graphql::{mutation_base, query_base, GraphQlRequest, GraphQlResponse, GraphQlVariable};
use crate::http_client::{build_request, HttpClient};
use crate::models::{TokenPair, User, UserId, UserUpdate};

/// Default GraphQL endpoint
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/graphql";

const USER_FIELDS: &[&str] = &["id", "email", "firstName", "lastName"];
const TOKEN_FIELDS: &[&str] = &["accessToken", "refreshToken", "tokenType"];

/// GraphQL user API; borrows auth headers from [`AuthApi`]
pub struct UserApi {
    url: String,
    http: HttpClient,
    auth: Arc<AuthApi>,
}

impl UserApi {
    pub fn new(url: impl Into<String>, http: HttpClient, auth: Arc<AuthApi>) -> Self {
        Self {
            url: url.into(),
            http,
            auth,
        }
    }

    /// `me` query for the user owning `token`
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let variables = [("token", GraphQlVariable::new("String!", token))];
        let query = query_base("me", "me", USER_FIELDS, &variables);
        tracing::debug!(query = %query, "GraphQL me query");

        self.send(GraphQlRequest::new(query, &variables), "me").await
    }

    /// `updateUser` mutation
    pub async fn update_user(&self, user_id: &UserId, user_data: &UserUpdate) -> Result<User> {
        let variables = [
            ("userId", GraphQlVariable::new("ID!", user_id.to_string())),
            (
                "userData",
                GraphQlVariable::new("UserUpdateInput!", serde_json::to_value(user_data)?),
            ),
        ];
        let mutation = mutation_base("updateUser", USER_FIELDS, &variables, "updateUser");

        self.send(GraphQlRequest::new(mutation, &variables), "updateUser")
            .await
    }

    /// `login` mutation; the returned token pair is persisted
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let variables = [
            ("email", GraphQlVariable::new("String!", email)),
            ("password", GraphQlVariable::new("String!", password)),
        ];
        let mutation = mutation_base("login", TOKEN_FIELDS, &variables, "login");

        let tokens: TokenPair = self
            .send(GraphQlRequest::new(mutation, &variables), "login")
            .await?;
        self.auth
            .store_tokens(&tokens.access_token, &tokens.refresh_token)
            .await?;

        tracing::info!(email = %email, "Logged in via GraphQL");
        Ok(tokens)
    }

    async fn send<T: DeserializeOwned>(&self, body: GraphQlRequest, field: &str) -> Result<T> {
        let builder = self
            .http
            .client()
            .post(&self.url)
            .headers(self.auth.headers().await?)
            .json(&body);

        let response: GraphQlResponse = self.http.execute_json(build_request(builder)?).await?;
        response.into_field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::storage::{MemoryStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use mockito::Matcher;
    use serde_json::json;

    fn apis(server: &mockito::ServerGuard, storage: &MemoryStorage) -> UserApi {
        let http = HttpClient::new(4, 5, 5).unwrap();
        let auth = Arc::new(AuthApi::new(
            format!("{}/api/auth", server.url()),
            http.clone(),
            Arc::new(storage.clone()),
        ));
        UserApi::new(format!("{}/graphql", server.url()), http, auth)
    }

    #[tokio::test]
    async fn test_me_query_sends_token_variable() {
        let mut server = mockito::Server::new_async().await;
        let storage = MemoryStorage::new();
        storage.set(ACCESS_TOKEN_KEY, "A1").unwrap();

        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer A1")
            .match_body(Matcher::PartialJson(json!({
                "query": "query me($token: String!) { me(token: $token) { id email firstName lastName } }",
                "variables": {"token": "A1"}
            })))
            .with_status(200)
            .with_body(
                json!({"data": {"me": {"id": "9", "email": "a@b.com", "firstName": "Ada", "lastName": null}}})
                    .to_string(),
            )
            .create_async()
            .await;

        let api = apis(&server, &storage);
        let user = api.current_user("A1").await.unwrap();
        assert_eq!(user.id, UserId::Str("9".to_string()));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_user_sends_camel_case_input() {
        let mut server = mockito::Server::new_async().await;
        let storage = MemoryStorage::new();

        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": {"userId": "9", "userData": {"lastName": "Hopper"}}
            })))
            .with_status(200)
            .with_body(
                json!({"data": {"updateUser": {"id": "9", "email": "a@b.com", "firstName": "Grace", "lastName": "Hopper"}}})
                    .to_string(),
            )
            .create_async()
            .await;

        let api = apis(&server, &storage);
        let user = api
            .update_user(
                &UserId::from("9"),
                &UserUpdate {
                    last_name: Some("Hopper".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.last_name.as_deref(), Some("Hopper"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_errors_become_errors() {
        let mut server = mockito::Server::new_async().await;
        let storage = MemoryStorage::new();

        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"session expired"}]}"#)
            .create_async()
            .await;

        let api = apis(&server, &storage);
        let err = api.current_user("A1").await.unwrap_err();
        assert!(matches!(err, AuthError::GraphQl(_)));
        assert!(err.is_session_error());
    }

    #[tokio::test]
    async fn test_http_error_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        let storage = MemoryStorage::new();

        server
            .mock("POST", "/graphql")
            .with_status(400)
            .with_body("Syntax Error: Expected Name")
            .create_async()
            .await;

        let api = apis(&server, &storage);
        let err = api.current_user("A1").await.unwrap_err();
        assert_eq!(err.to_string(), "Syntax Error: Expected Name");
    }

    #[tokio::test]
    async fn test_login_mutation_persists_tokens() {
        let mut server = mockito::Server::new_async().await;
        let storage = MemoryStorage::new();

        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": {"email": "a@b.com", "password": "pw"}
            })))
            .with_status(200)
            .with_body(
                json!({"data": {"login": {"accessToken": "GA", "refreshToken": "GR", "tokenType": "bearer"}}})
                    .to_string(),
            )
            .create_async()
            .await;

        let api = apis(&server, &storage);
        let tokens = api.login("a@b.com", "pw").await.unwrap();

        assert_eq!(tokens.access_token, "GA");
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("GA"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("GR"));
    }
}
