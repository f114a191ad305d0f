//! Inbound webhook route. Each activated trigger registers a sender under
//! `{workflow_id}/{node_id}`; Pipefy's POSTs are forwarded to it unchanged.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

pub type WebhookRoutes = Arc<RwLock<HashMap<String, mpsc::Sender<Value>>>>;

pub fn route_key(workflow_id: &str, node_id: &str) -> String {
    format!("{}/{}", workflow_id, node_id)
}

pub fn new_routes() -> WebhookRoutes {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Registers a trigger and returns the receiver to hand to its input 0.
pub async fn register(routes: &WebhookRoutes, workflow_id: &str, node_id: &str) -> mpsc::Receiver<Value> {
    let (tx, rx) = mpsc::channel(100);
    routes.write().await.insert(route_key(workflow_id, node_id), tx);
    rx
}

pub async fn unregister(routes: &WebhookRoutes, workflow_id: &str, node_id: &str) {
    routes.write().await.remove(&route_key(workflow_id, node_id));
}

pub fn router(routes: WebhookRoutes) -> Router {
    Router::new()
        .route("/webhook/{workflow_id}/{node_id}/webhook", post(receive))
        .with_state(routes)
}

async fn receive(
    Path((workflow_id, node_id)): Path<(String, String)>,
    State(routes): State<WebhookRoutes>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%workflow_id, %node_id, error = %e, "Rejected non-JSON webhook body");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "body must be JSON" })));
        }
    };

    let tx = routes.read().await.get(&route_key(&workflow_id, &node_id)).cloned();
    let Some(tx) = tx else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown webhook" })));
    };

    if tx.send(payload).await.is_err() {
        tracing::warn!(%workflow_id, %node_id, "Trigger is no longer consuming webhook events");
        return (StatusCode::GONE, Json(json!({ "error": "trigger stopped" })));
    }

    tracing::debug!(%workflow_id, %node_id, "Forwarded Pipefy webhook");
    (StatusCode::OK, Json(json!({ "status": "received" })))
}
