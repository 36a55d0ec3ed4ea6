mod fallback_executor;
mod prompt_service;
mod request_builder;

pub use fallback_executor::{FallbackExecutor, FallbackPolicy};
pub use prompt_service::PromptService;
pub use request_builder::RequestBuilder;
