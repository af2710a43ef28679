// GraphQL request and response envelopes

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GraphQlVariable;
use crate::error::{AuthError, Result};

/// `POST /graphql` body
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Map<String, Value>,
}

impl GraphQlRequest {
    /// Pair operation text with the values of its declared variables
    pub fn new(query: String, variables: &[(&str, GraphQlVariable)]) -> Self {
        let variables = variables
            .iter()
            .map(|(name, v)| (name.to_string(), v.value.clone()))
            .collect();

        Self { query, variables }
    }
}

/// One entry of the `errors` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// Response envelope; `data` is kept loose until a field is extracted
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    /// Absent, `null` and `[]` all mean no errors
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// Decode `data.<field>`, failing on reported errors or missing data
    pub fn into_field<T: DeserializeOwned>(self, field: &str) -> Result<T> {
        let errors = self.errors.unwrap_or_default();
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AuthError::GraphQl(message));
        }

        let value = self
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                AuthError::GraphQl(format!("GraphQL response has no data for `{}`", field))
            })?;

        Ok(serde_json::from_value(value)?)
    }
}
