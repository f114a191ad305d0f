use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

pub mod encryption;
pub mod file;
pub use file::FileStore;

/// Per-workflow key/value state the host keeps between activations.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_kv(&self, key: &str) -> Result<Option<Value>>;
    async fn set_kv(&self, key: &str, value: &Value) -> Result<()>;
    async fn delete_kv(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_kv(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_kv(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete_kv(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
