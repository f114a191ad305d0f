use async_trait::async_trait;
use crate::client::PipefyClient;
use crate::error::{PipefyError, PipefyResult};
use crate::queries::{self, NewWebhook, DEFAULT_WEBHOOK_ACTIONS};
use crate::stream_engine::StreamNode;
use tokio::sync::mpsc::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerAction {
    #[default]
    #[serde(rename = "*")]
    All,
    #[serde(rename = "added")]
    Added,
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "updated")]
    Updated,
}

impl TriggerAction {
    /// Whether the webhook name and e-mail fields apply to this action.
    pub fn needs_contact(&self) -> bool {
        matches!(self, TriggerAction::Added | TriggerAction::Updated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipefyTriggerConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub pipe_id: String,
    #[serde(default)]
    pub action: TriggerAction,
    #[serde(default = "default_resource")]
    pub resource: String,
    #[serde(rename = "webhookName", default)]
    pub webhook_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_resource() -> String {
    "pipes".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected pipe id, got {}", other))),
    }
}

impl PipefyTriggerConfig {
    pub fn from_value(config: Value) -> PipefyResult<Self> {
        let config: Self = serde_json::from_value(config)
            .map_err(|e| PipefyError::InvalidConfig(e.to_string()))?;
        if config.pipe_id.trim().is_empty() {
            return Err(PipefyError::MissingParameter("pipe_id".to_string()));
        }
        if config.resource != "pipes" {
            return Err(PipefyError::UnsupportedResource(config.resource));
        }
        if config.action.needs_contact() {
            if config.webhook_name.as_deref().map_or(true, str::is_empty) {
                return Err(PipefyError::MissingParameter("webhookName".to_string()));
            }
            if config.email.as_deref().map_or(true, str::is_empty) {
                return Err(PipefyError::MissingParameter("email".to_string()));
            }
        }
        Ok(config)
    }
}

/// What the trigger remembers about its remote registration between
/// activations. Serialized into the host's per-workflow store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationState {
    #[serde(rename = "webhookId", default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(rename = "webhookEvents", default, skip_serializing_if = "Option::is_none")]
    pub webhook_events: Option<Vec<String>>,
}

impl RegistrationState {
    pub fn is_registered(&self) -> bool {
        self.webhook_id.is_some()
    }

    fn cleared() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookOutcome {
    pub success: bool,
    pub state: RegistrationState,
}

pub struct PipefyTrigger {
    client: PipefyClient,
    config: PipefyTriggerConfig,
}

impl PipefyTrigger {
    pub fn new(client: PipefyClient, config: PipefyTriggerConfig) -> Self {
        Self { client, config }
    }

    /// True only when a stored id is still registered on the configured pipe.
    pub async fn check_exists(&self, state: &RegistrationState) -> PipefyResult<bool> {
        let Some(webhook_id) = state.webhook_id.as_deref() else {
            return Ok(false);
        };

        let response = self
            .client
            .request(&queries::pipe_webhooks_query(&self.config.pipe_id))
            .await?;

        if !response.has_data() {
            return Ok(false);
        }

        let exists = response
            .get("/pipe/webhooks")
            .and_then(|v| v.as_array())
            .is_some_and(|hooks| {
                hooks
                    .iter()
                    .filter_map(|h| h.get("id"))
                    .any(|id| id_matches(id, webhook_id))
            });
        tracing::debug!(webhook_id, exists, "Checked Pipefy webhook registration");
        Ok(exists)
    }

    /// Registers `webhook_url` on the pipe. The returned state carries the new
    /// id on success and is the input state otherwise. Name and e-mail are only
    /// shown for `added`/`updated`; other actions send them empty.
    pub async fn create(&self, state: RegistrationState, webhook_url: &str) -> PipefyResult<HookOutcome> {
        let hook = NewWebhook {
            pipe_id: self.config.pipe_id.clone(),
            name: self.config.webhook_name.clone().unwrap_or_default(),
            email: self.config.email.clone().unwrap_or_default(),
            url: webhook_url.to_string(),
        };

        let response = self.client.request(&queries::create_webhook_mutation(&hook)).await?;

        let webhook_id = response
            .get("/createWebhook/webhook/id")
            .or_else(|| response.get("/id"))
            .map(id_text);

        match webhook_id {
            Some(id) => {
                tracing::info!(pipe_id = %hook.pipe_id, webhook_id = %id, "Registered Pipefy webhook");
                Ok(HookOutcome {
                    success: true,
                    state: RegistrationState {
                        webhook_id: Some(id),
                        webhook_events: Some(DEFAULT_WEBHOOK_ACTIONS.iter().map(|a| a.to_string()).collect()),
                    },
                })
            }
            None => {
                tracing::warn!(pipe_id = %hook.pipe_id, "Pipefy create response carried no webhook id");
                Ok(HookOutcome { success: false, state })
            }
        }
    }

    /// Removes the remote webhook. Errors are reported as `success: false`
    /// with the state left as it was.
    pub async fn delete(&self, state: RegistrationState) -> HookOutcome {
        let Some(webhook_id) = state.webhook_id.clone() else {
            return HookOutcome { success: true, state };
        };

        match self.client.request(&queries::delete_webhook_mutation(&webhook_id)).await {
            Ok(_) => {
                tracing::info!(webhook_id = %webhook_id, "Removed Pipefy webhook");
                HookOutcome {
                    success: true,
                    state: RegistrationState::cleared(),
                }
            }
            Err(e) => {
                tracing::warn!(webhook_id = %webhook_id, error = %e, "Failed to remove Pipefy webhook");
                HookOutcome { success: false, state }
            }
        }
    }

    /// Turns an inbound webhook body into output records. Arrays yield one
    /// record per element, anything else is a single record.
    pub fn handle_webhook(&self, body: Value) -> Vec<Value> {
        match body {
            Value::Array(items) => items,
            other => vec![other],
        }
    }
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn id_matches(remote: &Value, stored: &str) -> bool {
    id_text(remote) == stored
}

#[async_trait]
impl StreamNode for PipefyTrigger {
    async fn run(&self, mut inputs: Vec<Receiver<Value>>, outputs: Vec<Sender<Value>>) -> Result<()> {
        // Input 0 is fed by the host's webhook route.
        if let Some(rx) = inputs.get_mut(0) {
            if let Some(tx) = outputs.first() {
                while let Some(body) = rx.recv().await {
                    for record in self.handle_webhook(body) {
                        tx.send(record).await?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_accepts_numeric_pipe_id() {
        let config = PipefyTriggerConfig::from_value(json!({
            "pipe_id": 42, "action": "added", "webhookName": "W", "email": "a@b.com"
        }))
        .unwrap();
        assert_eq!(config.pipe_id, "42");
        assert_eq!(config.action, TriggerAction::Added);
        assert_eq!(config.resource, "pipes");
    }

    #[test]
    fn contact_fields_required_for_added() {
        let err = PipefyTriggerConfig::from_value(json!({ "pipe_id": "1", "action": "added", "email": "e" }))
            .unwrap_err();
        assert!(matches!(err, PipefyError::MissingParameter(ref p) if p == "webhookName"));

        let config = PipefyTriggerConfig::from_value(json!({ "pipe_id": "1" })).unwrap();
        assert_eq!(config.action, TriggerAction::All);
    }

    #[test]
    fn state_serializes_with_host_keys() {
        let state = RegistrationState {
            webhook_id: Some("9".to_string()),
            webhook_events: None,
        };
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({ "webhookId": "9" }));
        let empty: RegistrationState = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.is_registered());
    }

    #[test]
    fn numeric_remote_ids_match_stored_strings() {
        assert!(id_matches(&json!(301), "301"));
        assert!(id_matches(&json!("301"), "301"));
        assert!(!id_matches(&json!("3011"), "301"));
    }
}
