use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use crate::client::PIPEFY_GRAPHQL_ENDPOINT;
use crate::integration_registry::PIPEFY_CREDENTIAL;
use crate::storage::encryption;

pub const TOKEN_ENV: &str = "PIPEFY_API_TOKEN";
pub const ENDPOINT_ENV: &str = "PIPEFY_ENDPOINT";

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    pub endpoint: Option<String>,
    pub log_level: Option<String>,
    /// Base URL the host serves webhook routes under, e.g. `https://flows.example.com`.
    pub webhook_base_url: Option<String>,
    /// Encrypted with the master key, see `storage::encryption`.
    pub api_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Config::get_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Config::get_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "pipefyflow", "cli")
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| PIPEFY_GRAPHQL_ENDPOINT.to_string())
    }

    pub fn log_filter(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }

    pub fn set_api_token(&mut self, token: &str) -> Result<()> {
        self.api_token = Some(encryption::encrypt(token)?);
        Ok(())
    }

    /// Environment first, then the stored (encrypted) token.
    pub fn api_token(&self) -> Result<Option<String>> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(Some(token));
            }
        }
        self.api_token.as_deref().map(encryption::decrypt).transpose()
    }

    /// Secrets map in the shape the node factory expects.
    pub fn secrets(&self) -> Result<HashMap<String, String>> {
        let mut secrets = HashMap::new();
        if let Some(token) = self.api_token()? {
            secrets.insert(PIPEFY_CREDENTIAL.to_string(), token);
        }
        Ok(secrets)
    }
}
