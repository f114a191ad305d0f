//! GraphQL documents for Pipefy webhook management.
//!
//! Values are interpolated through [`escape_string`] and [`render_id`], so a
//! name containing quotes or braces cannot break out of its literal. Plain
//! values (no quotes, backslashes or control characters) appear verbatim.

use serde_json::Value;

/// Card events every webhook created by these nodes subscribes to.
pub const DEFAULT_WEBHOOK_ACTIONS: [&str; 2] = ["card.create", "card.done"];

#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhook {
    pub pipe_id: String,
    pub name: String,
    pub email: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookAction {
    Create(NewWebhook),
    Delete { id: String },
    Update { id: String, email: String, actions: Vec<String> },
}

impl WebhookAction {
    /// Builds an action from its name and a loose data record. Accepts the
    /// verb (`create`) and the event spelling (`Added`), case-insensitively.
    pub fn from_record(action: &str, data: &Value) -> Option<Self> {
        match action.to_ascii_lowercase().as_str() {
            "create" | "added" => Some(WebhookAction::Create(NewWebhook {
                pipe_id: field(data, &["pipe_id", "pipeId"]),
                name: field(data, &["name", "webhookName"]),
                email: field(data, &["email"]),
                url: field(data, &["url", "webhookUrl", "postback"]),
            })),
            "delete" | "deleted" => Some(WebhookAction::Delete {
                id: field(data, &["id"]),
            }),
            "update" | "updated" => Some(WebhookAction::Update {
                id: field(data, &["id"]),
                email: field(data, &["email"]),
                actions: match data.get("actions") {
                    Some(Value::Array(items)) => items.iter().map(value_text).collect(),
                    Some(Value::String(s)) => s
                        .split(',')
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect(),
                    _ => Vec::new(),
                },
            }),
            _ => None,
        }
    }

    pub fn to_query(&self) -> String {
        match self {
            WebhookAction::Create(hook) => create_webhook_mutation(hook),
            WebhookAction::Delete { id } => delete_webhook_mutation(id),
            WebhookAction::Update { id, email, actions } => {
                format!(
                    "mutation {{ updateWebhook(input: {{ id: {} email: \"{}\" actions: {} }}) {{ webhook {{ id email actions }} }} }}",
                    render_id(id),
                    escape_string(email),
                    render_list(actions.iter().map(String::as_str)),
                )
            }
        }
    }
}

/// Renders the mutation for `action`, or an empty string for an unknown action.
pub fn render_action(action: &str, data: &Value) -> String {
    WebhookAction::from_record(action, data)
        .map(|a| a.to_query())
        .unwrap_or_default()
}

pub fn create_webhook_mutation(hook: &NewWebhook) -> String {
    format!(
        "mutation {{ createWebhook(input: {{ pipe_id: {} name: \"{}\" email: \"{}\" url: \"{}\" actions: {} }}) {{ webhook {{ id name }} }} }}",
        render_id(&hook.pipe_id),
        escape_string(&hook.name),
        escape_string(&hook.email),
        escape_string(&hook.url),
        render_list(DEFAULT_WEBHOOK_ACTIONS.iter().copied()),
    )
}

pub fn delete_webhook_mutation(id: &str) -> String {
    format!(
        "mutation {{ deleteWebhook(input: {{ id: {} }}) {{ success }} }}",
        render_id(id)
    )
}

/// Lists every webhook registered on a pipe.
pub fn pipe_webhooks_query(pipe_id: &str) -> String {
    format!(
        "{{ pipe(id: {}) {{ id webhooks {{ id actions email name url }} }} }}",
        render_id(pipe_id)
    )
}

/// Escapes a value for use inside a double-quoted GraphQL string literal.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Numeric ids stay bare; anything else becomes an escaped string literal.
pub fn render_id(id: &str) -> String {
    let trimmed = id.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        trimmed.to_string()
    } else {
        format!("\"{}\"", escape_string(id))
    }
}

fn render_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = items.map(|i| format!("\"{}\"", escape_string(i))).collect();
    format!("[{}]", quoted.join(", "))
}

fn field(data: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| data.get(*k).filter(|v| !v.is_null()))
        .map(value_text)
        .unwrap_or_default()
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
