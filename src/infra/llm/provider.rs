use std::sync::Arc;

use crate::domain::{
    AiError, GenerationDefaults, ProviderDescriptor, ProviderError, ProviderKind, Request,
};

use super::{ChatCompletionProvider, GenerativeHttpProvider, HostedLlmProvider};

/// One text-generation backend.
///
/// `execute` performs exactly one outbound call and never retries; any
/// substitution on failure belongs to the caller.
pub trait LlmProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    fn execute(&self, request: &Request) -> Result<String, ProviderError>;

    fn provider_id(&self) -> &str {
        &self.descriptor().name
    }
}

/// Builds the concrete provider for `descriptor.kind`.
pub fn build_provider(
    descriptor: ProviderDescriptor,
    defaults: GenerationDefaults,
) -> Result<Arc<dyn LlmProvider>, AiError> {
    let provider: Arc<dyn LlmProvider> = match descriptor.kind {
        ProviderKind::ChatCompletion => {
            Arc::new(ChatCompletionProvider::new(descriptor, defaults)?)
        }
        ProviderKind::HostedLlm => Arc::new(HostedLlmProvider::new(descriptor, defaults)?),
        ProviderKind::GenerativeHttp => {
            Arc::new(GenerativeHttpProvider::new(descriptor, defaults)?)
        }
    };
    Ok(provider)
}
