//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StartupError;

pub const API_KEY_ENV_VAR: &str = "GOOGLE_CLI";
pub const PROVIDER_ENV_VAR: &str = "CHAT_PROVIDER";
pub const MODEL_ENV_VAR: &str = "CHAT_MODEL";
pub const SYSTEM_INSTRUCTIONS_ENV_VAR: &str = "CHAT_SYSTEM_INSTRUCTIONS";
pub const BASE_URL_ENV_VAR: &str = "CHAT_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "CHAT_TIMEOUT_SEC";
pub const LOG_PATH_ENV_VAR: &str = "CHAT_LOG_PATH";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "answer concisely.";
pub const DEFAULT_LOG_PATH: &str = "debug.log";

/// Which provider backs the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    /// Present whenever `provider` is `Gemini`.
    pub api_key: Option<String>,
    pub model: String,
    pub system_instructions: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub log_path: PathBuf,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("system_instructions", &self.system_instructions)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("log_path", &self.log_path)
            .finish()
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let provider = match value(PROVIDER_ENV_VAR).as_deref() {
            None | Some("gemini") => ProviderKind::Gemini,
            Some("mock") => ProviderKind::Mock,
            Some(other) => {
                return Err(StartupError::InvalidConfig {
                    var: PROVIDER_ENV_VAR,
                    value: other.to_string(),
                    reason: "expected one of: gemini, mock".to_string(),
                })
            }
        };

        let api_key = value(API_KEY_ENV_VAR);
        if provider == ProviderKind::Gemini && api_key.is_none() {
            return Err(StartupError::MissingCredential {
                var: API_KEY_ENV_VAR,
            });
        }

        let timeout = match value(TIMEOUT_ENV_VAR) {
            None => None,
            Some(raw) => Some(parse_timeout(&raw)?),
        };

        Ok(Self {
            provider,
            api_key,
            model: value(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_instructions: value(SYSTEM_INSTRUCTIONS_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTIONS.to_string()),
            base_url: value(BASE_URL_ENV_VAR),
            timeout,
            log_path: value(LOG_PATH_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, StartupError> {
    let invalid = |reason: &str| StartupError::InvalidConfig {
        var: TIMEOUT_ENV_VAR,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let seconds: u64 = raw
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if seconds == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ChatConfig, StartupError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ChatConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_key_is_fatal_for_gemini() {
        let error = config_from(&[]).expect_err("key is required");
        assert!(matches!(
            error,
            StartupError::MissingCredential { var: "GOOGLE_CLI" }
        ));
        assert!(error.to_string().contains("GOOGLE_CLI"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let error = config_from(&[(API_KEY_ENV_VAR, "   ")]).expect_err("blank key");
        assert!(matches!(error, StartupError::MissingCredential { .. }));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = config_from(&[(API_KEY_ENV_VAR, "k")]).expect("config");

        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.system_instructions, DEFAULT_SYSTEM_INSTRUCTIONS);
        assert_eq!(config.base_url, None);
        assert_eq!(config.timeout, None);
        assert_eq!(config.log_path, PathBuf::from("debug.log"));
    }

    #[test]
    fn mock_provider_needs_no_key() {
        let config = config_from(&[(PROVIDER_ENV_VAR, "mock")]).expect("config");
        assert_eq!(config.provider, ProviderKind::Mock);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = config_from(&[(PROVIDER_ENV_VAR, "other")]).expect_err("unknown");
        assert!(error.to_string().contains("CHAT_PROVIDER"));
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        let zero = config_from(&[(API_KEY_ENV_VAR, "k"), (TIMEOUT_ENV_VAR, "0")]);
        assert!(matches!(zero, Err(StartupError::InvalidConfig { .. })));

        let text = config_from(&[(API_KEY_ENV_VAR, "k"), (TIMEOUT_ENV_VAR, "soon")]);
        assert!(matches!(text, Err(StartupError::InvalidConfig { .. })));

        let ok = config_from(&[(API_KEY_ENV_VAR, "k"), (TIMEOUT_ENV_VAR, "30")]).expect("config");
        assert_eq!(ok.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = config_from(&[(API_KEY_ENV_VAR, "super-secret")]).expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
