use serde_json::Value;

use crate::domain::{AiError, Request};
use crate::infra::llm::ProviderRegistry;

use super::{FallbackExecutor, FallbackPolicy};

/// Fluent composition of one [`Request`], consumed by [`RequestBuilder::execute`].
///
/// `where_attribute` pairs are held back and written into the request's
/// extension attributes only when `execute` runs, in call order.
pub struct RequestBuilder<'a> {
    registry: &'a ProviderRegistry,
    provider: String,
    fallback: Option<FallbackPolicy>,
    conditions: Vec<(String, Value)>,
    request: Request,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(registry: &'a ProviderRegistry, provider: impl Into<String>) -> Self {
        Self {
            registry,
            provider: provider.into(),
            fallback: None,
            conditions: Vec::new(),
            request: Request::new(),
        }
    }

    pub fn set_content(mut self, content: impl Into<String>) -> Self {
        self.request.set_content(content);
        self
    }

    pub fn add_content(mut self, content: impl AsRef<str>) -> Self {
        self.request.add_content(content);
        self
    }

    pub fn set_model(mut self, model: impl Into<String>) -> Self {
        self.request.set_model(model);
        self
    }

    pub fn set_max_tokens(mut self, max_tokens: u32) -> Self {
        self.request.set_max_tokens(max_tokens);
        self
    }

    pub fn set_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn fallback(mut self, provider: impl Into<String>) -> Self {
        self.fallback = Some(FallbackPolicy::new(provider));
        self
    }

    pub fn where_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn fallback_provider(&self) -> Option<&str> {
        self.fallback.as_ref().map(FallbackPolicy::provider)
    }

    pub fn execute(self) -> Result<String, AiError> {
        let Self {
            registry,
            provider,
            fallback,
            conditions,
            mut request,
        } = self;

        for (key, value) in conditions {
            request.set_attribute(key, value);
        }

        FallbackExecutor::new(registry).execute(request, &provider, fallback.as_ref())
    }
}
