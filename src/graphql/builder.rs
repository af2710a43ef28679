// Query and mutation text builders
//
// Field lists and variable types are spliced into the operation text as-is.
// A malformed field list produces malformed GraphQL that the server rejects.

use serde_json::Value;

/// A typed operation variable, e.g. `token: String!`
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlVariable {
    /// GraphQL type literal such as `String!` or `UserUpdateInput!`
    pub ty: String,
    pub value: Value,
}

impl GraphQlVariable {
    pub fn new(ty: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            ty: ty.into(),
            value: value.into(),
        }
    }
}

/// Build a named query calling `operation` and selecting `fields`
pub fn query_base(
    name: &str,
    operation: &str,
    fields: &[&str],
    variables: &[(&str, GraphQlVariable)],
) -> String {
    build_operation("query", name, operation, fields, variables)
}

/// Build a named mutation calling `operation` and selecting `fields`
pub fn mutation_base(
    name: &str,
    fields: &[&str],
    variables: &[(&str, GraphQlVariable)],
    operation: &str,
) -> String {
    build_operation("mutation", name, operation, fields, variables)
}

fn build_operation(
    kind: &str,
    name: &str,
    operation: &str,
    fields: &[&str],
    variables: &[(&str, GraphQlVariable)],
) -> String {
    let selection = fields.join(" ");

    if variables.is_empty() {
        return format!("{kind} {name} {{ {operation} {{ {selection} }} }}");
    }

    let declarations = variables
        .iter()
        .map(|(var, v)| format!("${}: {}", var, v.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let arguments = variables
        .iter()
        .map(|(var, _)| format!("{var}: ${var}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{kind} {name}({declarations}) {{ {operation}({arguments}) {{ {selection} }} }}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_with_variable() {
        let query = query_base(
            "me",
            "me",
            &["id", "email", "firstName", "lastName"],
            &[("token", GraphQlVariable::new("String!", "abc"))],
        );
        assert_eq!(
            query,
            "query me($token: String!) { me(token: $token) { id email firstName lastName } }"
        );
    }

    #[test]
    fn test_query_without_variables() {
        let query = query_base("viewer", "me", &["id"], &[]);
        assert_eq!(query, "query viewer { me { id } }");
    }

    #[test]
    fn test_mutation_keeps_variable_order() {
        let mutation = mutation_base(
            "updateUser",
            &["id", "email"],
            &[
                ("userId", GraphQlVariable::new("ID!", "7")),
                ("userData", GraphQlVariable::new("UserUpdateInput!", json!({}))),
            ],
            "updateUser",
        );
        assert_eq!(
            mutation,
            "mutation updateUser($userId: ID!, $userData: UserUpdateInput!) { \
             updateUser(userId: $userId, userData: $userData) { id email } }"
        );
    }

    #[test]
    fn test_fields_are_not_validated() {
        let query = query_base("me", "me", &["id {", ""], &[]);
        assert_eq!(query, "query me { me { id {  } } }");
    }
}
