mod chat_completion;
mod generative_http;
mod hosted_llm;
mod http;
mod provider;
mod provider_registry;
mod response_parsing;

pub use chat_completion::ChatCompletionProvider;
pub use generative_http::GenerativeHttpProvider;
pub use hosted_llm::HostedLlmProvider;
pub use provider::{LlmProvider, build_provider};
pub use provider_registry::ProviderRegistry;
