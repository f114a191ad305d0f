use async_trait::async_trait;
use crate::stream_engine::StreamNode;
use tokio::sync::mpsc::{Receiver, Sender};
use serde_json::Value;
use anyhow::Result;

/// Prints every record it receives, one JSON document per line.
pub struct ConsoleOutputNode {
    label: Option<String>,
}

impl ConsoleOutputNode {
    pub fn new(label: Option<String>) -> Self {
        Self { label }
    }
}

#[async_trait]
impl StreamNode for ConsoleOutputNode {
    async fn run(&self, mut inputs: Vec<Receiver<Value>>, _outputs: Vec<Sender<Value>>) -> Result<()> {
        let mut count = 0usize;
        if let Some(mut rx) = inputs.pop() {
            while let Some(value) = rx.recv().await {
                let line = serde_json::to_string(&value)?;
                match &self.label {
                    Some(label) => println!("[{}] {}", label, line),
                    None => println!("{}", line),
                }
                count += 1;
            }
        }
        tracing::debug!(count, "Console output drained");
        Ok(())
    }
}
