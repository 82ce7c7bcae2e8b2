//! Model provider factory.
//!
//! Creates a model client from the application configuration. The rest of
//! the workspace only sees `Arc<dyn ModelClient>`, so tests can substitute
//! the mock provider through the same seam.

use crate::client::ModelClient;
use crate::providers::{BedrockClient, MockClient, OllamaClient};
use labchat_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a model client for the configured provider.
///
/// # Errors
/// Returns `AppError::Config` when the provider is unknown or required
/// credentials are missing.
pub fn create_client(config: &AppConfig) -> AppResult<Arc<dyn ModelClient>> {
    match config.provider.to_lowercase().as_str() {
        "bedrock" => {
            let api_key = config.api_key.as_deref().ok_or_else(|| {
                AppError::Config("Bedrock provider requires LABCHAT_API_KEY".to_string())
            })?;

            let client = BedrockClient::builder(&config.region, api_key)
                .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .read_timeout(Duration::from_secs(config.read_timeout_secs))
                .max_attempts(config.retry_max_attempts)
                .build()?;

            Ok(Arc::new(client))
        }
        "ollama" => Ok(Arc::new(OllamaClient::new())),
        "mock" => Ok(Arc::new(MockClient::new(384))),
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(provider: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.provider = provider.to_string();
        config
    }

    #[test]
    fn test_create_mock_client() {
        let client = create_client(&config_for("mock")).unwrap();
        assert_eq!(client.provider_name(), "mock");
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&config_for("ollama")).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_bedrock_requires_api_key() {
        let mut config = config_for("bedrock");
        config.api_key = None;
        assert!(create_client(&config).is_err());

        config.api_key = Some("key".to_string());
        let client = create_client(&config).unwrap();
        assert_eq!(client.provider_name(), "bedrock");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client(&config_for("nope")) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            other => panic!("Expected config error, got {:?}", other.map(|c| c.provider_name().to_string())),
        }
    }
}
