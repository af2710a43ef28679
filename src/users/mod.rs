// User API module (GraphQL)

mod api;

pub use api::{UserApi, DEFAULT_GRAPHQL_URL};
