//! Generation backend clients

pub mod http;
pub mod traits;

pub use http::HttpGenerationClient;
pub use traits::{Generation, GenerationClient, TokenUsage};
