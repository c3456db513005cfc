//! Remote responder configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Credentials and endpoints for remote responders.
///
/// Both backends are optional: with neither configured, the factory forces
/// offline mode and the local responder carries everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key.
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible base URL override.
    pub openai_base_url: Option<String>,

    /// OpenAI model override.
    pub openai_model: Option<String>,

    /// Base URL of the healthcare-search sidecar.
    pub sidecar_base_url: Option<String>,
}

impl AiConfig {
    /// Check if OpenAI is configured.
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if the sidecar is configured.
    pub fn has_sidecar(&self) -> bool {
        self.sidecar_base_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Check if any remote responder is configured.
    pub fn has_remote(&self) -> bool {
        self.has_openai() || self.has_sidecar()
    }

    /// Validate remote responder configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.sidecar_base_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidSidecarUrl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_no_remotes() {
        let config = AiConfig::default();
        assert!(!config.has_openai());
        assert!(!config.has_sidecar());
        assert!(!config.has_remote());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_key_does_not_count_as_configured() {
        let config = AiConfig {
            openai_api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!config.has_openai());
    }

    #[test]
    fn sidecar_url_must_be_http() {
        let config = AiConfig {
            sidecar_base_url: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSidecarUrl)
        ));
    }

    #[test]
    fn configured_remotes_are_detected() {
        let config = AiConfig {
            openai_api_key: Some("sk-test".to_string()),
            sidecar_base_url: Some("http://127.0.0.1:5001".to_string()),
            ..Default::default()
        };
        assert!(config.has_openai());
        assert!(config.has_sidecar());
        assert!(config.has_remote());
        assert!(config.validate().is_ok());
    }
}
