//! One request contract for several text-generation backends, with an
//! optional single fallback attempt.
//!
//! ```no_run
//! use promptrelay::app::PromptService;
//!
//! # fn main() -> Result<(), promptrelay::domain::AiError> {
//! let service = PromptService::from_env()?;
//! let text = service
//!     .request()
//!     .add_content("Summarize the release notes.")
//!     .set_provider("openai")
//!     .fallback("bedrock")
//!     .execute()?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod domain;
pub mod infra;
