use std::sync::Arc;

use chat_provider::ChatProvider;
use chat_provider_gemini::{GeminiProvider, GeminiProviderConfig};
use chat_provider_mock::MockProvider;

use crate::config::{ChatConfig, ProviderKind, API_KEY_ENV_VAR};
use crate::error::StartupError;

/// Builds the provider selected by `config`.
pub fn provider_for_config(config: &ChatConfig) -> Result<Arc<dyn ChatProvider>, StartupError> {
    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockProvider::echo())),
        ProviderKind::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .ok_or(StartupError::MissingCredential {
                    var: API_KEY_ENV_VAR,
                })?;
            let mut provider_config = GeminiProviderConfig::new(api_key, config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider_config = provider_config.with_base_url(base_url.clone());
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }
            Ok(Arc::new(GeminiProvider::new(provider_config)?))
        }
    }
}
