mod common;

use common::{client, MockTransport};
use pipefy_flow::stream_engine::nodes::{PipefyNode, PipefyOperation};
use pipefy_flow::stream_engine::{NodeFactory, StreamNode};
use pipefy_flow::PipefyError;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::mpsc;

async fn run(node: &dyn StreamNode, items: Vec<Value>) -> anyhow::Result<Vec<Value>> {
    let (in_tx, in_rx) = mpsc::channel(10);
    let (out_tx, mut out_rx) = mpsc::channel(10);
    for item in items {
        in_tx.send(item).await?;
    }
    drop(in_tx);

    node.run(vec![in_rx], vec![out_tx]).await?;

    let mut outputs = Vec::new();
    while let Some(v) = out_rx.recv().await {
        outputs.push(v);
    }
    Ok(outputs)
}

#[tokio::test]
async fn create_emits_webhook_for_every_item() {
    let transport = MockTransport::new();
    transport.respond(json!({ "createWebhook": { "webhook": { "id": "1", "name": "hook-a" } } }));
    transport.respond(json!({ "createWebhook": { "webhook": { "id": "2", "name": "hook-b" } } }));

    let node = PipefyNode::new(
        client(&transport),
        json!({
            "resource": "webhook",
            "operation": "create",
            "pipe_id": "{{ pipe }}",
            "name": "hook-{{ suffix }}",
            "email": "ops@example.com",
            "url": "https://hooks.example.com"
        }),
    )
    .unwrap();

    let outputs = run(&node, vec![json!({ "pipe": 10, "suffix": "a" }), json!({ "pipe": 11, "suffix": "b" })])
        .await
        .unwrap();

    assert_eq!(outputs, vec![json!({ "id": "1", "name": "hook-a" }), json!({ "id": "2", "name": "hook-b" })]);
    let queries = transport.queries();
    assert!(queries[0].contains("pipe_id: 10"));
    assert!(queries[0].contains("name: \"hook-a\""));
    assert!(queries[1].contains("pipe_id: 11"));
}

#[tokio::test]
async fn show_lists_webhooks_without_actions() {
    let transport = MockTransport::new();
    transport.respond(json!({
        "pipe": { "id": "123", "webhooks": [
            { "id": "1", "actions": ["card.create"], "email": "a@b", "name": "one", "url": "https://1" },
            { "id": "2", "actions": ["card.done"], "email": "c@d", "name": "two", "url": "https://2" }
        ] }
    }));

    let node = PipefyNode::new(client(&transport), json!({ "operation": "show", "pipe_id": 123 })).unwrap();
    assert_eq!(node.operation(), PipefyOperation::WebhookShow);

    let outputs = run(&node, vec![Value::Null]).await.unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|w| w.get("actions").is_none()));
    assert_eq!(outputs[1]["name"], json!("two"));
}

#[tokio::test]
async fn create_fails_when_response_lacks_webhook() {
    let transport = MockTransport::new();
    transport.respond(json!({ "createWebhook": null }));

    let node = PipefyNode::new(
        client(&transport),
        json!({ "pipe_id": "1", "name": "n", "email": "e", "url": "u" }),
    )
    .unwrap();

    assert!(run(&node, vec![Value::Null]).await.is_err());
}

#[tokio::test]
async fn unknown_resource_is_rejected() {
    let transport = MockTransport::new();
    let err = PipefyNode::new(client(&transport), json!({ "resource": "card", "operation": "create" }))
        .err()
        .unwrap();
    assert!(matches!(err, PipefyError::UnsupportedResource(ref r) if r == "card"));
}

#[tokio::test]
async fn missing_parameter_is_rejected_at_construction() {
    let transport = MockTransport::new();
    let err = PipefyNode::new(client(&transport), json!({ "operation": "create", "pipe_id": "1" }))
        .err()
        .unwrap();
    assert!(matches!(err, PipefyError::MissingParameter(ref p) if p == "name"));
}

#[tokio::test]
async fn factory_builds_nodes_from_secrets() {
    let transport = MockTransport::new();
    transport.respond(json!({ "pipe": { "id": "5", "webhooks": [] } }));
    let factory = NodeFactory::new(transport.clone());

    let no_secrets = HashMap::new();
    let err = factory
        .create("pipefy", json!({ "operation": "show", "pipe_id": "5" }), &no_secrets)
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "No credentials got returned!");

    let mut secrets = HashMap::new();
    secrets.insert("pipefyApi".to_string(), "secret".to_string());
    let node = factory
        .create("pipefy", json!({ "operation": "show", "pipe_id": "5" }), &secrets)
        .unwrap();
    let outputs = run(node.as_ref(), vec![Value::Null]).await.unwrap();
    assert!(outputs.is_empty());
    assert_eq!(transport.tokens(), vec!["secret"]);

    assert!(factory.create("pipefy_trigger", json!({ "pipe_id": "5" }), &secrets).is_ok());
    assert!(factory.create("http_request", json!({}), &secrets).is_err());
    assert_eq!(factory.node_types(), vec!["console_output", "pipefy", "pipefy_trigger"]);
}
