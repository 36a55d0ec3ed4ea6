use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{AiError, ProviderError, Request};
use crate::infra::llm::{LlmProvider, ProviderRegistry};

/// Names the provider substituted once when the primary attempt fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    provider: String,
}

impl FallbackPolicy {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

enum FallbackState {
    TryPrimary {
        provider: Arc<dyn LlmProvider>,
    },
    CheckFallback {
        primary: ProviderError,
    },
    TryFallback {
        provider: Arc<dyn LlmProvider>,
        primary: ProviderError,
    },
}

/// Runs one primary attempt and at most one fallback attempt.
pub struct FallbackExecutor<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> FallbackExecutor<'a> {
    pub const MAX_ATTEMPTS: usize = 2;

    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Executes `request` against `provider`, substituting `fallback` once on failure.
    ///
    /// Before the fallback attempt the request's `model` and `max_tokens` are
    /// replaced by the fallback descriptor's defaults. An unregistered primary
    /// fails with [`AiError::UnknownProvider`]; an unregistered fallback fails
    /// with [`AiError::UnknownFallback`], which keeps the primary failure.
    pub fn execute(
        &self,
        mut request: Request,
        provider: &str,
        fallback: Option<&FallbackPolicy>,
    ) -> Result<String, AiError> {
        let mut attempts = 0;
        let mut state = FallbackState::TryPrimary {
            provider: self.registry.resolve(provider)?,
        };

        loop {
            state = match state {
                FallbackState::TryPrimary { provider } => {
                    attempts += 1;
                    match provider.execute(&request) {
                        Ok(text) => return Ok(text),
                        Err(primary) => {
                            warn!(
                                provider = provider.provider_id(),
                                attempt = attempts,
                                error = %primary,
                                "primary provider failed"
                            );
                            FallbackState::CheckFallback { primary }
                        }
                    }
                }
                FallbackState::CheckFallback { primary } => {
                    let Some(policy) = fallback else {
                        return Err(AiError::PrimaryFailedNoFallback { primary });
                    };
                    let Ok(provider) = self.registry.resolve(policy.provider()) else {
                        return Err(AiError::UnknownFallback {
                            name: policy.provider().trim().to_string(),
                            primary,
                        });
                    };
                    let descriptor = provider.descriptor();
                    request
                        .set_model(descriptor.model.clone())
                        .set_max_tokens(descriptor.max_tokens);
                    info!(
                        from = primary.provider_name(),
                        to = provider.provider_id(),
                        model = %descriptor.model,
                        "switching to fallback provider"
                    );
                    FallbackState::TryFallback { provider, primary }
                }
                FallbackState::TryFallback { provider, primary } => {
                    attempts += 1;
                    debug_assert!(attempts <= Self::MAX_ATTEMPTS);
                    return provider.execute(&request).map_err(|fallback| {
                        error!(
                            primary = %primary,
                            fallback = %fallback,
                            attempts,
                            "primary and fallback providers failed"
                        );
                        AiError::BothFailed { primary, fallback }
                    });
                }
            };
        }
    }
}
