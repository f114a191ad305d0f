use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PropertyOption {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeProperty {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub property_type: String, // text, select
    pub options: Option<Vec<PropertyOption>>, // For select
    pub default: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    /// Shown only when every listed property has one of the listed values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebhookDescription {
    pub name: String,
    pub http_method: String,
    pub response_mode: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeType {
    pub id: String,
    pub label: String,
    pub category: String, // Trigger, Integration
    pub description: Option<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub credentials: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhooks: Vec<WebhookDescription>,
    pub properties: Vec<NodeProperty>,
}

impl NodeType {
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn opt(name: &str, value: &str, description: Option<&str>) -> PropertyOption {
    PropertyOption {
        name: name.to_string(),
        value: value.to_string(),
        description: description.map(str::to_string),
    }
}

fn text(name: &str, label: &str, required: bool) -> NodeProperty {
    NodeProperty {
        name: name.to_string(),
        label: label.to_string(),
        property_type: "text".to_string(),
        options: None,
        default: Some(String::new()),
        required,
        description: None,
        display_options: None,
    }
}

fn show_when(pairs: Vec<(&str, Vec<&str>)>) -> Option<BTreeMap<String, Vec<String>>> {
    Some(
        pairs
            .into_iter()
            .map(|(k, vs)| (k.to_string(), vs.into_iter().map(str::to_string).collect()))
            .collect(),
    )
}

fn pipefy_node() -> NodeType {
    let webhook_create = || show_when(vec![("resource", vec!["webhook"]), ("operation", vec!["create"])]);

    NodeType {
        id: "pipefy".to_string(),
        label: "Pipefy".to_string(),
        category: "Integration".to_string(),
        description: Some("Consume the Pipefy API".to_string()),
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: vec![crate::integration_registry::PIPEFY_CREDENTIAL.to_string()],
        webhooks: vec![],
        properties: vec![
            NodeProperty {
                name: "resource".to_string(),
                label: "Resource".to_string(),
                property_type: "select".to_string(),
                options: Some(vec![opt("WebHook", "webhook", None)]),
                default: Some("webhook".to_string()),
                required: true,
                description: Some("The resource to operate on".to_string()),
                display_options: None,
            },
            NodeProperty {
                name: "operation".to_string(),
                label: "Operation".to_string(),
                property_type: "select".to_string(),
                options: Some(vec![
                    opt("Create", "create", Some("Create a webhook")),
                    opt("Show", "show", Some("List the webhooks of a pipe")),
                ]),
                default: Some("create".to_string()),
                required: true,
                description: Some("The operation to perform".to_string()),
                display_options: show_when(vec![("resource", vec!["webhook"])]),
            },
            NodeProperty {
                display_options: show_when(vec![("resource", vec!["webhook"]), ("operation", vec!["create", "show"])]),
                ..text("pipe_id", "Pipe ID", true)
            },
            NodeProperty {
                display_options: webhook_create(),
                ..text("name", "Webhook Name", true)
            },
            NodeProperty {
                display_options: webhook_create(),
                ..text("email", "E-mail", true)
            },
            NodeProperty {
                display_options: webhook_create(),
                description: Some("URL Pipefy will POST card events to".to_string()),
                ..text("url", "URL", true)
            },
        ],
    }
}

fn pipefy_trigger_node() -> NodeType {
    NodeType {
        id: "pipefy_trigger".to_string(),
        label: "Pipefy Trigger".to_string(),
        category: "Trigger".to_string(),
        description: Some("Starts the workflow when Pipefy events occur".to_string()),
        inputs: vec![],
        outputs: vec!["main".to_string()],
        credentials: vec![crate::integration_registry::PIPEFY_CREDENTIAL.to_string()],
        webhooks: vec![WebhookDescription {
            name: "default".to_string(),
            http_method: "POST".to_string(),
            response_mode: "onReceived".to_string(),
            path: "webhook".to_string(),
        }],
        properties: vec![
            text("pipe_id", "Pipe ID", true),
            NodeProperty {
                name: "action".to_string(),
                label: "Action".to_string(),
                property_type: "select".to_string(),
                options: Some(vec![
                    opt("All", "*", Some("Any change")),
                    opt("Added", "added", Some("Data got added")),
                    opt("Deleted", "deleted", Some("Data got deleted")),
                    opt("Updated", "updated", Some("Data got updated")),
                ]),
                default: Some("*".to_string()),
                required: false,
                description: Some("Type of action to receive notifications about".to_string()),
                display_options: None,
            },
            NodeProperty {
                name: "resource".to_string(),
                label: "Resources".to_string(),
                property_type: "select".to_string(),
                options: Some(vec![opt("Pipes", "pipes", None)]),
                default: Some("pipes".to_string()),
                required: false,
                description: Some("Type of object to receive notifications about".to_string()),
                display_options: None,
            },
            NodeProperty {
                display_options: show_when(vec![("action", vec!["added", "updated"])]),
                ..text("webhookName", "Webhook Name", true)
            },
            NodeProperty {
                display_options: show_when(vec![("action", vec!["added", "updated"]), ("resource", vec!["pipes"])]),
                ..text("email", "E-mail", true)
            },
        ],
    }
}

pub fn get_node_registry() -> Vec<NodeType> {
    vec![pipefy_node(), pipefy_trigger_node()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_both_nodes() {
        let ids: Vec<String> = get_node_registry().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["pipefy", "pipefy_trigger"]);
    }

    #[test]
    fn trigger_contact_fields_follow_action() {
        let trigger = pipefy_trigger_node();
        let shown = trigger.property("webhookName").and_then(|p| p.display_options.clone()).unwrap();
        assert_eq!(shown.get("action").unwrap(), &vec!["added".to_string(), "updated".to_string()]);
        assert_eq!(trigger.webhooks[0].http_method, "POST");
    }
}
