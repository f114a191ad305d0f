use serde_json::Value;
use thiserror::Error;

/// Failures raised by the GraphQL transport before the response reaches the
/// request helper.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Non-success HTTP status. `body` is the parsed JSON body when there was one.
    #[error("HTTP error {status}")]
    Http { status: u16, body: Option<Value> },

    /// The server answered with GraphQL `errors` and no usable `data`.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors surfaced to the host by the Pipefy nodes.
#[derive(Error, Debug)]
pub enum PipefyError {
    #[error("No credentials got returned!")]
    MissingCredentials,

    #[error("The Pipefy credentials are not valid!")]
    InvalidCredentials,

    /// The remote payload carried `success: false`.
    #[error("Pipefy error response: {code} ({info})")]
    Remote { code: String, info: String },

    /// HTTP failure with a structured `{error, error_info}` body.
    #[error("Pipefy error response [{status}]: {message}{}", detail_suffix(.detail))]
    Formatted {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("The resource \"{0}\" is not known!")]
    UnsupportedResource(String),

    #[error("The operation \"{operation}\" is not known for resource \"{resource}\"!")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Invalid node configuration: {0}")]
    InvalidConfig(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" - {}", d),
        None => String::new(),
    }
}

pub type PipefyResult<T> = std::result::Result<T, PipefyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_message_includes_optional_detail() {
        let err = PipefyError::Formatted {
            status: 422,
            message: "invalid".to_string(),
            detail: Some("pipe not found".to_string()),
        };
        assert_eq!(err.to_string(), "Pipefy error response [422]: invalid - pipe not found");

        let err = PipefyError::Formatted {
            status: 500,
            message: "boom".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "Pipefy error response [500]: boom");
    }

    #[test]
    fn remote_message_carries_code_and_info() {
        let err = PipefyError::Remote {
            code: "E".to_string(),
            info: "I".to_string(),
        };
        assert_eq!(err.to_string(), "Pipefy error response: E (I)");
    }
}
