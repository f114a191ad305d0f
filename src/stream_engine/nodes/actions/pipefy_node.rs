use async_trait::async_trait;
use crate::client::PipefyClient;
use crate::error::{PipefyError, PipefyResult};
use crate::queries::{self, NewWebhook};
use crate::stream_engine::{ParamResolver, StreamNode};
use tokio::sync::mpsc::{Receiver, Sender};
use serde_json::Value;
use anyhow::{anyhow, Result};

/// The resource/operation pairs the Pipefy node supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipefyOperation {
    WebhookCreate,
    WebhookShow,
}

impl PipefyOperation {
    pub fn parse(resource: &str, operation: &str) -> PipefyResult<Self> {
        match (resource, operation) {
            ("webhook", "create") => Ok(PipefyOperation::WebhookCreate),
            ("webhook", "show") => Ok(PipefyOperation::WebhookShow),
            ("webhook", other) => Err(PipefyError::UnsupportedOperation {
                resource: resource.to_string(),
                operation: other.to_string(),
            }),
            (other, _) => Err(PipefyError::UnsupportedResource(other.to_string())),
        }
    }

    /// Reads `resource`/`operation` from node config, defaulting to
    /// `webhook`/`create` like the node description does.
    pub fn from_config(config: &Value) -> PipefyResult<Self> {
        let resource = config.get("resource").and_then(|v| v.as_str()).unwrap_or("webhook");
        let operation = config.get("operation").and_then(|v| v.as_str()).unwrap_or("create");
        Self::parse(resource, operation)
    }

    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            PipefyOperation::WebhookCreate => &["pipe_id", "name", "email", "url"],
            PipefyOperation::WebhookShow => &["pipe_id"],
        }
    }
}

pub struct PipefyNode {
    client: PipefyClient,
    operation: PipefyOperation,
    config: Value,
    params: ParamResolver,
}

impl PipefyNode {
    pub fn new(client: PipefyClient, config: Value) -> PipefyResult<Self> {
        let operation = PipefyOperation::from_config(&config)?;
        for name in operation.required_params() {
            if config.get(*name).map_or(true, |v| v.is_null()) {
                return Err(PipefyError::MissingParameter(name.to_string()));
            }
        }
        Ok(Self {
            client,
            operation,
            config,
            params: ParamResolver::new(),
        })
    }

    pub fn operation(&self) -> PipefyOperation {
        self.operation
    }

    /// Runs the configured operation for one input item and returns the
    /// records it produces.
    pub async fn execute_item(&self, item: &Value) -> Result<Vec<Value>> {
        match self.operation {
            PipefyOperation::WebhookCreate => {
                let hook = NewWebhook {
                    pipe_id: self.params.required(&self.config, "pipe_id", item)?,
                    name: self.params.required(&self.config, "name", item)?,
                    email: self.params.required(&self.config, "email", item)?,
                    url: self.params.required(&self.config, "url", item)?,
                };
                let response = self.client.request(&queries::create_webhook_mutation(&hook)).await?;
                let webhook = response
                    .get("/createWebhook/webhook")
                    .cloned()
                    .ok_or_else(|| anyhow!("Pipefy response has no createWebhook.webhook: {}", response.data))?;
                tracing::info!(pipe_id = %hook.pipe_id, webhook = %webhook, "Created Pipefy webhook");
                Ok(vec![webhook])
            }
            PipefyOperation::WebhookShow => {
                let pipe_id = self.params.required(&self.config, "pipe_id", item)?;
                let response = self.client.request(&queries::pipe_webhooks_query(&pipe_id)).await?;
                let Some(webhooks) = response.get("/pipe/webhooks").and_then(|v| v.as_array()) else {
                    tracing::warn!(pipe_id = %pipe_id, "Pipefy returned no webhooks for pipe");
                    return Ok(Vec::new());
                };
                Ok(webhooks.iter().cloned().map(strip_actions).collect())
            }
        }
    }
}

fn strip_actions(mut webhook: Value) -> Value {
    if let Some(obj) = webhook.as_object_mut() {
        obj.remove("actions");
    }
    webhook
}

#[async_trait]
impl StreamNode for PipefyNode {
    async fn run(&self, mut inputs: Vec<Receiver<Value>>, outputs: Vec<Sender<Value>>) -> Result<()> {
        if let Some(rx) = inputs.get_mut(0) {
            if let Some(tx) = outputs.first() {
                while let Some(item) = rx.recv().await {
                    for record in self.execute_item(&item).await? {
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
    fn parses_known_pairs() {
        assert_eq!(PipefyOperation::parse("webhook", "create").unwrap(), PipefyOperation::WebhookCreate);
        assert_eq!(PipefyOperation::parse("webhook", "show").unwrap(), PipefyOperation::WebhookShow);
        assert_eq!(PipefyOperation::from_config(&json!({})).unwrap(), PipefyOperation::WebhookCreate);
    }

    #[test]
    fn unknown_resource_names_the_value() {
        let err = PipefyOperation::parse("card", "create").unwrap_err();
        assert!(matches!(err, PipefyError::UnsupportedResource(ref r) if r == "card"));
        assert_eq!(err.to_string(), "The resource \"card\" is not known!");
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = PipefyOperation::parse("webhook", "archive").unwrap_err();
        assert!(matches!(err, PipefyError::UnsupportedOperation { .. }));
    }

    #[test]
    fn strip_actions_keeps_other_fields() {
        let hook = strip_actions(json!({ "id": "1", "actions": ["card.done"], "url": "u" }));
        assert_eq!(hook, json!({ "id": "1", "url": "u" }));
    }
}
