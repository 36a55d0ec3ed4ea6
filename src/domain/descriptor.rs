use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AiError, Request};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TOP_P: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ChatCompletion,
    HostedLlm,
    GenerativeHttp,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatCompletion => "chat_completion",
            Self::HostedLlm => "hosted_llm",
            Self::GenerativeHttp => "generative_http",
        }
    }
}

/// Sampling values applied when a request carries no override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
        }
    }
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub region: Option<String>,
    pub timeout: Option<Duration>,
}

/// Read-only configuration record of one registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    pub connection: ConnectionParams,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            model: model.into(),
            max_tokens,
            connection: ConnectionParams::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.connection.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.connection.base_url = Some(base_url.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.connection.region = Some(region.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if self.name.trim().is_empty() {
            return Err(AiError::config("provider name must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(AiError::config(format!(
                "provider '{}' must declare a default model",
                self.name
            )));
        }
        if self.max_tokens == 0 {
            return Err(AiError::config(format!(
                "provider '{}' max_tokens must be greater than 0",
                self.name
            )));
        }
        if let Some(base_url) = &self.connection.base_url {
            if base_url.trim().is_empty() {
                return Err(AiError::config(format!(
                    "provider '{}' base URL must not be empty",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Values a provider actually sends for `request`.
    pub fn resolve(&self, request: &Request, defaults: &GenerationDefaults) -> EffectiveParams {
        EffectiveParams {
            model: request.model().unwrap_or(self.model.as_str()).to_string(),
            max_tokens: request.max_tokens().unwrap_or(self.max_tokens),
            temperature: request
                .number_attribute("temperature")
                .map(|value| value as f32)
                .unwrap_or(defaults.temperature),
            top_p: request
                .number_attribute("top_p")
                .map(|value| value as f32)
                .unwrap_or(defaults.top_p),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}
