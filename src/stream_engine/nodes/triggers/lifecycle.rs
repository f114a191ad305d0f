use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use super::pipefy_trigger::{PipefyTrigger, RegistrationState};
use crate::storage::KvStore;

/// Key under which a trigger instance keeps its registration state.
pub fn static_data_key(workflow_id: &str, node_id: &str) -> String {
    format!("pipefy_trigger:{}:{}", workflow_id, node_id)
}

/// Callback URL the host serves for a trigger instance.
pub fn webhook_url(base_url: &str, workflow_id: &str, node_id: &str) -> String {
    format!("{}/webhook/{}/{}/webhook", base_url.trim_end_matches('/'), workflow_id, node_id)
}

/// Keeps the remote registration in step with workflow activation, persisting
/// the state between hook calls.
pub struct WebhookLifecycle {
    trigger: Arc<PipefyTrigger>,
    store: Arc<dyn KvStore>,
    key: String,
}

impl WebhookLifecycle {
    pub fn new(trigger: Arc<PipefyTrigger>, store: Arc<dyn KvStore>, workflow_id: &str, node_id: &str) -> Self {
        Self {
            trigger,
            store,
            key: static_data_key(workflow_id, node_id),
        }
    }

    pub async fn load_state(&self) -> Result<RegistrationState> {
        match self.store.get_kv(&self.key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(RegistrationState::default()),
        }
    }

    async fn save_state(&self, state: &RegistrationState) -> Result<()> {
        if state.is_registered() {
            self.store.set_kv(&self.key, &serde_json::to_value(state)?).await
        } else {
            self.store.delete_kv(&self.key).await
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        let state = self.load_state().await?;
        Ok(self.trigger.check_exists(&state).await?)
    }

    /// Creates the webhook unless the stored one is still registered.
    pub async fn activate(&self, webhook_url: &str) -> Result<bool> {
        let state = self.load_state().await?;
        if self.trigger.check_exists(&state).await? {
            tracing::debug!(key = %self.key, "Pipefy webhook already registered");
            return Ok(true);
        }

        let outcome = self.trigger.create(state, webhook_url).await?;
        if outcome.success {
            self.save_state(&outcome.state).await?;
        }
        Ok(outcome.success)
    }

    pub async fn deactivate(&self) -> Result<bool> {
        let state = self.load_state().await?;
        let outcome = self.trigger.delete(state).await;
        if outcome.success {
            self.save_state(&outcome.state).await?;
        }
        Ok(outcome.success)
    }

    /// Stored state as JSON, for display.
    pub async fn describe(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.load_state().await?)?)
    }
}
