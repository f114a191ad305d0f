use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;
use anyhow::{Result, anyhow};
use crate::client::{GraphQlTransport, PipefyClient};
use crate::stream_engine::StreamNode;
use crate::stream_engine::nodes;

type NodeCreator = Box<dyn Fn(Value, &HashMap<String, String>) -> Result<Box<dyn StreamNode>> + Send + Sync>;

pub struct NodeFactory {
    creators: HashMap<String, NodeCreator>,
}

impl NodeFactory {
    pub fn new(transport: Arc<dyn GraphQlTransport>) -> Self {
        let mut factory = Self {
            creators: HashMap::new(),
        };
        factory.register_defaults(transport);
        factory
    }

    pub fn register<F>(&mut self, type_name: &str, creator: F)
    where
        F: Fn(Value, &HashMap<String, String>) -> Result<Box<dyn StreamNode>> + Send + Sync + 'static,
    {
        self.creators.insert(type_name.to_string(), Box::new(creator));
    }

    pub fn create(&self, type_name: &str, config: Value, secrets: &HashMap<String, String>) -> Result<Box<dyn StreamNode>> {
        match self.creators.get(type_name) {
            Some(creator) => creator(config, secrets),
            None => Err(anyhow!("Unknown node type: {}", type_name)),
        }
    }

    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    fn register_defaults(&mut self, transport: Arc<dyn GraphQlTransport>) {
        self.register("console_output", |config, _| {
            let label = config.get("label").and_then(|v| v.as_str()).map(str::to_string);
            Ok(Box::new(nodes::ConsoleOutputNode::new(label)))
        });

        let t = transport.clone();
        self.register("pipefy", move |config, secrets| {
            let client = PipefyClient::from_secrets(secrets, t.clone())?;
            Ok(Box::new(nodes::PipefyNode::new(client, config)?))
        });

        self.register("pipefy_trigger", move |config, secrets| {
            let client = PipefyClient::from_secrets(secrets, transport.clone())?;
            let config = nodes::PipefyTriggerConfig::from_value(config)?;
            Ok(Box::new(nodes::PipefyTrigger::new(client, config)))
        });
    }
}
