use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{
    AiError, ConnectionParams, GenerationDefaults, ProviderDescriptor, ProviderKind,
};

use super::env::{parse_max_tokens, parse_timeout_seconds, read_env_var};

const ENV_CONFIG_PATH: &str = "PROMPTRELAY_CONFIG";
const ENV_DEFAULT_PROVIDER: &str = "PROMPTRELAY_DEFAULT_PROVIDER";
const ENV_GLOBAL_TIMEOUT_SECS: &str = "PROMPTRELAY_LLM_TIMEOUT_SECS";
const ENV_AWS_REGION: &str = "AWS_REGION";

const DEFAULT_PROVIDER: &str = "bedrock";

/// Per-provider environment overrides, applied only to entries that exist.
struct EnvOverrides {
    provider: &'static str,
    model: &'static str,
    max_tokens: &'static str,
    api_key: &'static str,
}

const ENV_OVERRIDES: &[EnvOverrides] = &[
    EnvOverrides {
        provider: "openai",
        model: "PROMPTRELAY_OPENAI_MODEL",
        max_tokens: "PROMPTRELAY_OPENAI_MAX_TOKENS",
        api_key: "OPENAI_API_KEY",
    },
    EnvOverrides {
        provider: "bedrock",
        model: "PROMPTRELAY_BEDROCK_MODEL",
        max_tokens: "PROMPTRELAY_BEDROCK_MAX_TOKENS",
        api_key: "AWS_BEARER_TOKEN_BEDROCK",
    },
    EnvOverrides {
        provider: "gemini",
        model: "PROMPTRELAY_GEMINI_MODEL",
        max_tokens: "PROMPTRELAY_GEMINI_MAX_TOKENS",
        api_key: "GEMINI_API_KEY",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub default_provider: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub defaults: GenerationDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    fn new(kind: ProviderKind, model: &str) -> Self {
        Self {
            kind,
            model: model.to_string(),
            max_tokens: None,
            api_key: None,
            base_url: None,
            region: None,
            timeout_secs: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                max_tokens: Some(4000),
                ..ProviderConfig::new(ProviderKind::ChatCompletion, "gpt-3.5-turbo")
            },
        );
        providers.insert(
            "bedrock".to_string(),
            ProviderConfig {
                max_tokens: Some(6000),
                region: Some("us-west-2".to_string()),
                ..ProviderConfig::new(ProviderKind::HostedLlm, "anthropic.claude-v2")
            },
        );
        providers.insert(
            "gemini".to_string(),
            ProviderConfig::new(ProviderKind::GenerativeHttp, "gemini-pro"),
        );

        Self {
            default_provider: DEFAULT_PROVIDER.to_string(),
            providers,
            defaults: GenerationDefaults::default(),
        }
    }
}

impl AiConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AiError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| AiError::config(format!("config JSON could not be parsed: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            AiError::config(format!(
                "config file '{}' could not be read: {err}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Built-in providers (or the file named by `PROMPTRELAY_CONFIG`) with
    /// environment overrides applied.
    pub fn from_env() -> Result<Self, AiError> {
        Self::from_env_with(read_env_var)
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self, AiError>
    where
        F: Fn(&str) -> Result<Option<String>, AiError>,
    {
        let mut config = match lookup(ENV_CONFIG_PATH)? {
            Some(path) => Self::from_json_file(path.trim())?,
            None => Self::default(),
        };

        if let Some(default_provider) = lookup(ENV_DEFAULT_PROVIDER)? {
            config.default_provider = default_provider.trim().to_string();
        }

        for overrides in ENV_OVERRIDES {
            let Some(entry) = config.providers.get_mut(overrides.provider) else {
                continue;
            };
            if let Some(model) = lookup(overrides.model)? {
                entry.model = model.trim().to_string();
            }
            if let Some(max_tokens) = lookup(overrides.max_tokens)? {
                entry.max_tokens = Some(parse_max_tokens(overrides.max_tokens, &max_tokens)?);
            }
            if let Some(api_key) = lookup(overrides.api_key)? {
                entry.api_key = Some(api_key);
            }
        }

        if let Some(region) = lookup(ENV_AWS_REGION)? {
            for entry in config.providers.values_mut() {
                if entry.kind == ProviderKind::HostedLlm {
                    entry.region = Some(region.trim().to_string());
                }
            }
        }

        if let Some(timeout) = lookup(ENV_GLOBAL_TIMEOUT_SECS)? {
            let timeout = parse_timeout_seconds(ENV_GLOBAL_TIMEOUT_SECS, &timeout)?;
            for entry in config.providers.values_mut() {
                entry.timeout_secs.get_or_insert(timeout);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if self.default_provider.trim().is_empty() {
            return Err(AiError::config("default_provider must not be empty"));
        }
        if !self.providers.contains_key(self.default_provider.trim()) {
            return Err(AiError::config(format!(
                "default_provider '{}' is not configured",
                self.default_provider
            )));
        }

        let defaults = &self.defaults;
        if defaults.max_tokens == 0 {
            return Err(AiError::config("defaults.max_tokens must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&defaults.temperature) {
            return Err(AiError::config(format!(
                "defaults.temperature must be in 0.0..=2.0 (got {})",
                defaults.temperature
            )));
        }
        if !(0.0..=1.0).contains(&defaults.top_p) {
            return Err(AiError::config(format!(
                "defaults.top_p must be in 0.0..=1.0 (got {})",
                defaults.top_p
            )));
        }

        for (name, entry) in &self.providers {
            if name.trim().is_empty() {
                return Err(AiError::config("provider name must not be empty"));
            }
            if entry.model.trim().is_empty() {
                return Err(AiError::config(format!(
                    "provider '{name}' must declare a default model"
                )));
            }
            if entry.max_tokens == Some(0) {
                return Err(AiError::config(format!(
                    "provider '{name}' max_tokens must be greater than 0"
                )));
            }
            if entry.timeout_secs == Some(0) {
                return Err(AiError::config(format!(
                    "provider '{name}' timeout_secs must be greater than 0"
                )));
            }
        }
        Ok(())
    }

    pub fn descriptors(&self) -> Result<Vec<ProviderDescriptor>, AiError> {
        self.validate()?;
        Ok(self
            .providers
            .iter()
            .map(|(name, entry)| ProviderDescriptor {
                name: name.trim().to_string(),
                kind: entry.kind,
                model: entry.model.trim().to_string(),
                max_tokens: entry.max_tokens.unwrap_or(self.defaults.max_tokens),
                connection: ConnectionParams {
                    api_key: entry
                        .api_key
                        .as_deref()
                        .map(str::trim)
                        .filter(|key| !key.is_empty())
                        .map(ToOwned::to_owned),
                    base_url: entry.base_url.clone(),
                    region: entry.region.clone(),
                    timeout: entry.timeout_secs.map(Duration::from_secs),
                },
            })
            .collect())
    }
}
