pub mod graphql;
pub mod request;

pub use graphql::{GraphQlTransport, ReqwestTransport, PIPEFY_GRAPHQL_ENDPOINT};
pub use request::{ApiResponse, PipefyClient};
