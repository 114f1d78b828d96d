pub mod config;
pub mod error;
pub mod llm;
pub mod secrets;

// Re-export commonly used types
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use llm::{split_terms, GeminiModel, TextModel, GEMINI_MODEL};
pub use secrets::SecretStore;
