use crate::domain::{AiError, Request};
use crate::infra::config::AiConfig;
use crate::infra::llm::ProviderRegistry;

use super::{FallbackExecutor, FallbackPolicy, RequestBuilder};

#[derive(Clone)]
pub struct PromptService {
    registry: ProviderRegistry,
    default_provider: String,
}

impl PromptService {
    pub fn new(
        registry: ProviderRegistry,
        default_provider: impl Into<String>,
    ) -> Result<Self, AiError> {
        let default_provider = default_provider.into().trim().to_string();
        if !registry.contains(&default_provider) {
            return Err(AiError::unknown_provider(default_provider));
        }

        Ok(Self {
            registry,
            default_provider,
        })
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let registry = ProviderRegistry::from_config(config)?;
        Self::new(registry, config.default_provider.as_str())
    }

    pub fn from_env() -> Result<Self, AiError> {
        Self::from_config(&AiConfig::from_env()?)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Starts a builder bound to the default provider.
    pub fn request(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.registry, self.default_provider.as_str())
    }

    /// Runs a prepared request; `provider` overrides the default.
    pub fn execute(
        &self,
        request: Request,
        provider: Option<&str>,
        fallback: Option<&FallbackPolicy>,
    ) -> Result<String, AiError> {
        let provider = provider.unwrap_or(&self.default_provider);
        FallbackExecutor::new(&self.registry).execute(request, provider, fallback)
    }
}
