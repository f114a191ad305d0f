use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use super::KvStore;

/// JSON file backed store. The whole map is rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `state.json` in the user's data directory.
    pub fn default_location() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "pipefyflow", "cli")
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(Self::new(proj_dirs.data_dir().join("state.json")))
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get_kv(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set_kv(&self, key: &str, value: &Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.clone());
        self.write_all(&entries).await
    }

    async fn delete_kv(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
