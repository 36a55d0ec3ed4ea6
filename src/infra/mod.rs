pub mod config;
mod env;
pub mod llm;
