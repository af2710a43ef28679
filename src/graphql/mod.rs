// GraphQL plumbing
// String-template operation builders and the request/response envelopes

mod builder;
mod envelope;

pub use builder::{mutation_base, query_base, GraphQlVariable};
pub use envelope::{GraphQlError, GraphQlRequest, GraphQlResponse};
