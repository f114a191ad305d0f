#![allow(dead_code)]

use async_trait::async_trait;
use pipefy_flow::client::{GraphQlTransport, PipefyClient};
use pipefy_flow::credentials::PipefyCredentials;
use pipefy_flow::TransportError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted transport: answers requests in order and records what was sent.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn fail(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn queries(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, q)| q.clone()).collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl GraphQlTransport for MockTransport {
    async fn execute(&self, token: &str, query: &str) -> Result<Value, TransportError> {
        self.sent.lock().unwrap().push((token.to_string(), query.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for query: {}", query))
    }
}

pub fn client(transport: &Arc<MockTransport>) -> PipefyClient {
    PipefyClient::new(PipefyCredentials::new("test-token"), transport.clone())
}
