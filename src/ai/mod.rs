//! AI service integration for story text and illustration generation
//!
//! Story text and image descriptions come from a Gemini model hosted on
//! Vertex AI; illustrations come from OpenAI's Images API.

pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::VertexTextClient;
pub use mock::{MockImageGenerationClient, MockTextGenerationClient};
pub use openai::OpenAiImageClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Generate text for `prompt`, fully assembled regardless of `stream`.
    ///
    /// Returns an empty string when the model produced no usable text.
    async fn generate_text(&self, prompt: &str, stream: bool) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate one image and return its hosted URL, if the service gave one.
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>>;
}
