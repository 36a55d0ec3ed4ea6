use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    InvalidResponse,
    RequestFailure,
}

/// Classified failure of a single provider call.
///
/// Every failure that leaves a provider is one of these two kinds; raw
/// transport errors are converted before crossing the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("invalid response from {provider} provider: {response}")]
    InvalidResponse { provider: String, response: String },
    #[error("request to {provider} provider failed: {message}")]
    RequestFailure { provider: String, message: String },
}

impl ProviderError {
    pub fn invalid_response(provider: impl Into<String>, response: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            response: response.into(),
        }
    }

    pub fn request_failure(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestFailure {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::InvalidResponse { .. } => ProviderErrorKind::InvalidResponse,
            Self::RequestFailure { .. } => ProviderErrorKind::RequestFailure,
        }
    }

    pub fn provider_name(&self) -> &str {
        match self {
            Self::InvalidResponse { provider, .. } | Self::RequestFailure { provider, .. } => {
                provider
            }
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidResponse { response, .. } => response,
            Self::RequestFailure { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("provider '{name}' is not registered")]
    UnknownProvider { name: String },
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("fallback provider '{name}' is not registered after primary failure: {primary}")]
    UnknownFallback {
        name: String,
        #[source]
        primary: ProviderError,
    },
    #[error("primary provider failed and no fallback is configured: {primary}")]
    PrimaryFailedNoFallback {
        #[source]
        primary: ProviderError,
    },
    #[error("primary and fallback providers both failed (primary: {primary}; fallback: {fallback})")]
    BothFailed {
        primary: ProviderError,
        #[source]
        fallback: ProviderError,
    },
}

impl AiError {
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The failure of the first attempt, when execution got that far.
    pub fn primary_failure(&self) -> Option<&ProviderError> {
        match self {
            Self::PrimaryFailedNoFallback { primary }
            | Self::UnknownFallback { primary, .. }
            | Self::BothFailed { primary, .. } => Some(primary),
            Self::UnknownProvider { .. } | Self::Config { .. } => None,
        }
    }

    pub fn fallback_failure(&self) -> Option<&ProviderError> {
        match self {
            Self::BothFailed { fallback, .. } => Some(fallback),
            _ => None,
        }
    }
}
