use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::TransportError;

pub const PIPEFY_GRAPHQL_ENDPOINT: &str = "https://app.pipefy.com/graphql";

/// Sends one GraphQL document with a bearer token and returns the payload.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(&self, token: &str, query: &str) -> Result<Value, TransportError>;
}

pub struct ReqwestTransport {
    endpoint: String,
    client: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(PIPEFY_GRAPHQL_ENDPOINT.to_string())
    }
}

impl ReqwestTransport {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl GraphQlTransport for ReqwestTransport {
    async fn execute(&self, token: &str, query: &str) -> Result<Value, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = resp.status();
        let body_bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: serde_json::from_slice(&body_bytes).ok(),
            });
        }

        let body: Value = serde_json::from_slice(&body_bytes)?;
        extract_payload(body)
    }
}

/// Unwraps the GraphQL envelope. Bodies without `data` or `errors` come back
/// untouched so the caller can inspect them.
pub fn extract_payload(mut body: Value) -> Result<Value, TransportError> {
    let messages: Vec<String> = body
        .get("errors")
        .and_then(|e| e.as_array())
        .map(|errors| {
            errors
                .iter()
                .map(|e| match e.get("message").and_then(|m| m.as_str()) {
                    Some(m) => m.to_string(),
                    None => e.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let data = body.get_mut("data").map(Value::take);
    match data {
        Some(Value::Null) | None if !messages.is_empty() => Err(TransportError::GraphQl(messages)),
        Some(data) => Ok(data),
        None => Ok(body),
    }
}
