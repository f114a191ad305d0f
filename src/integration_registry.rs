use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CredentialProperty {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub property_type: String, // text, password, etc.
    pub required: bool,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IntegrationDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub credentials: Vec<CredentialProperty>,
}

pub const PIPEFY_CREDENTIAL: &str = "pipefyApi";
pub const PIPEFY_TOKEN_FIELD: &str = "apiToken";

/// Credential descriptor for the Pipefy API.
pub fn pipefy_api_credential() -> IntegrationDefinition {
    IntegrationDefinition {
        name: PIPEFY_CREDENTIAL.to_string(),
        display_name: "Pipefy API".to_string(),
        description: "Personal access token for the Pipefy GraphQL API".to_string(),
        credentials: vec![CredentialProperty {
            name: PIPEFY_TOKEN_FIELD.to_string(),
            label: "API Token".to_string(),
            property_type: "password".to_string(),
            required: true,
            default: Some(String::new()),
            description: None,
        }],
    }
}

pub fn get_integration_registry() -> Vec<IntegrationDefinition> {
    vec![pipefy_api_credential()]
}
