use anyhow::{anyhow, Result};
use minijinja::Environment;
use serde_json::Value;

use crate::error::PipefyError;

/// Resolves node parameters against the item being processed. String values
/// containing `{{ ... }}` are rendered as templates with the item as context.
pub struct ParamResolver {
    env: Environment<'static>,
}

impl Default for ParamResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamResolver {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn optional(&self, config: &Value, name: &str, item: &Value) -> Result<Option<String>> {
        let raw = match config.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let resolved = if raw.contains("{{") {
            self.env
                .render_str(&raw, item)
                .map_err(|e| anyhow!("Failed to render parameter '{}': {}", name, e))?
        } else {
            raw
        };

        Ok(Some(resolved).filter(|s| !s.is_empty()))
    }

    pub fn required(&self, config: &Value, name: &str, item: &Value) -> Result<String> {
        self.optional(config, name, item)?
            .ok_or_else(|| PipefyError::MissingParameter(name.to_string()).into())
    }
}
