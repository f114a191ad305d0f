use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::client::graphql::GraphQlTransport;
use crate::credentials::PipefyCredentials;
use crate::error::{PipefyError, PipefyResult, TransportError};

/// Raw payload wrapped under both keys the nodes read from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiResponse {
    pub data: Value,
    #[serde(rename = "additionalData")]
    pub additional_data: Value,
}

impl ApiResponse {
    fn wrap(raw: Value) -> Self {
        Self {
            data: raw.clone(),
            additional_data: raw,
        }
    }

    /// JSON pointer lookup into `data`, e.g. `/createWebhook/webhook`.
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.data.pointer(pointer).filter(|v| !v.is_null())
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_null()
    }
}

#[derive(Clone)]
pub struct PipefyClient {
    credentials: PipefyCredentials,
    transport: Arc<dyn GraphQlTransport>,
}

impl PipefyClient {
    pub fn new(credentials: PipefyCredentials, transport: Arc<dyn GraphQlTransport>) -> Self {
        Self { credentials, transport }
    }

    pub fn from_secrets(
        secrets: &HashMap<String, String>,
        transport: Arc<dyn GraphQlTransport>,
    ) -> PipefyResult<Self> {
        Ok(Self::new(PipefyCredentials::from_secrets(secrets)?, transport))
    }

    /// Sends a query or mutation and normalizes the failure shapes Pipefy
    /// produces into [`PipefyError`].
    pub async fn request(&self, query: &str) -> PipefyResult<ApiResponse> {
        tracing::debug!(query_len = query.len(), "Sending Pipefy GraphQL request");

        let raw = self
            .transport
            .execute(self.credentials.api_token(), query)
            .await
            .map_err(normalize_error)?;

        if raw.get("success") == Some(&Value::Bool(false)) {
            return Err(PipefyError::Remote {
                code: text(raw.get("error")),
                info: text(raw.get("error_info")),
            });
        }

        Ok(ApiResponse::wrap(raw))
    }
}

fn normalize_error(err: TransportError) -> PipefyError {
    if err.status() == Some(401) {
        return PipefyError::InvalidCredentials;
    }

    if let TransportError::Http { status, body: Some(body) } = &err {
        if let Some(message) = body.get("error").filter(|e| is_present(e)) {
            let detail = body
                .get("error_info")
                .filter(|e| is_present(e))
                .map(|e| text(Some(e)));
            return PipefyError::Formatted {
                status: *status,
                message: text(Some(message)),
                detail,
            };
        }
    }

    tracing::debug!(error = %err, "Passing transport error through");
    PipefyError::Transport(err)
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_http_error_is_formatted() {
        let err = normalize_error(TransportError::Http {
            status: 404,
            body: Some(json!({ "error": "Not found", "error_info": "pipe 1" })),
        });
        assert_eq!(err.to_string(), "Pipefy error response [404]: Not found - pipe 1");
    }

    #[test]
    fn unstructured_http_error_passes_through() {
        let err = normalize_error(TransportError::Http { status: 502, body: None });
        assert!(matches!(err, PipefyError::Transport(TransportError::Http { status: 502, .. })));
    }

    #[test]
    fn unauthorized_wins_over_body() {
        let err = normalize_error(TransportError::Http {
            status: 401,
            body: Some(json!({ "error": "whatever" })),
        });
        assert!(matches!(err, PipefyError::InvalidCredentials));
    }
}
