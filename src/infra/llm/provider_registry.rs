use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{AiError, ProviderDescriptor};
use crate::infra::config::AiConfig;

use super::{LlmProvider, build_provider};

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one provider per configured entry.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let mut registry = Self::new();
        for descriptor in config.descriptors()? {
            registry.register_shared(build_provider(descriptor, config.defaults)?)?;
        }
        Ok(registry)
    }

    pub fn register<P>(&mut self, provider: P) -> Result<(), AiError>
    where
        P: LlmProvider + 'static,
    {
        self.register_shared(Arc::new(provider))
    }

    pub fn register_shared(&mut self, provider: Arc<dyn LlmProvider>) -> Result<(), AiError> {
        let provider_id = provider.provider_id().trim();
        if provider_id.is_empty() {
            return Err(AiError::config("provider name must not be empty"));
        }
        if self.providers.contains_key(provider_id) {
            return Err(AiError::config(format!(
                "provider '{provider_id}' is already registered"
            )));
        }

        debug!(
            provider = provider_id,
            kind = provider.descriptor().kind.as_str(),
            "registered provider"
        );
        self.providers.insert(provider_id.to_string(), provider);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LlmProvider>, AiError> {
        let name = name.trim();
        self.providers
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| AiError::unknown_provider(name))
    }

    pub fn descriptor_of(&self, name: &str) -> Result<&ProviderDescriptor, AiError> {
        let name = name.trim();
        self.providers
            .get(name)
            .map(|provider| provider.descriptor())
            .ok_or_else(|| AiError::unknown_provider(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name.trim())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.providers.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
