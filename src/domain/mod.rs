mod descriptor;
mod errors;
mod request;

pub use descriptor::{
    ConnectionParams, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, EffectiveParams,
    GenerationDefaults, ProviderDescriptor, ProviderKind,
};
pub use errors::{AiError, ProviderError, ProviderErrorKind};
pub use request::Request;
