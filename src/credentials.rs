use std::collections::HashMap;
use std::fmt;

use crate::error::{PipefyError, PipefyResult};
use crate::integration_registry::{PIPEFY_CREDENTIAL, PIPEFY_TOKEN_FIELD};

/// Bearer token for the Pipefy API.
#[derive(Clone)]
pub struct PipefyCredentials {
    api_token: String,
}

impl PipefyCredentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self { api_token: api_token.into() }
    }

    /// Looks the token up in the host secrets map, either under the credential
    /// name or as `pipefyApi.apiToken`.
    pub fn from_secrets(secrets: &HashMap<String, String>) -> PipefyResult<Self> {
        let dotted = format!("{}.{}", PIPEFY_CREDENTIAL, PIPEFY_TOKEN_FIELD);
        secrets
            .get(&dotted)
            .or_else(|| secrets.get(PIPEFY_CREDENTIAL))
            .filter(|token| !token.is_empty())
            .map(|token| Self::new(token.clone()))
            .ok_or(PipefyError::MissingCredentials)
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl fmt::Debug for PipefyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipefyCredentials")
            .field("api_token", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_dotted_key_before_plain_key() {
        let mut secrets = HashMap::new();
        secrets.insert("pipefyApi".to_string(), "plain".to_string());
        secrets.insert("pipefyApi.apiToken".to_string(), "dotted".to_string());
        let creds = PipefyCredentials::from_secrets(&secrets).unwrap();
        assert_eq!(creds.api_token(), "dotted");
    }

    #[test]
    fn empty_or_missing_token_is_an_error() {
        let mut secrets = HashMap::new();
        assert!(matches!(
            PipefyCredentials::from_secrets(&secrets),
            Err(PipefyError::MissingCredentials)
        ));
        secrets.insert("pipefyApi".to_string(), String::new());
        assert!(PipefyCredentials::from_secrets(&secrets).is_err());
    }

    #[test]
    fn debug_hides_token() {
        let creds = PipefyCredentials::new("secret-token");
        assert!(!format!("{:?}", creds).contains("secret-token"));
    }
}
