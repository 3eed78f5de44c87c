use super::client::VertexHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    HarmBlockThreshold, HarmCategory, SafetySetting,
};
use crate::ai::TextGenerationService;
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;

pub const TEMPERATURE: f32 = 0.8;
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

const MODERATED_CATEGORIES: [HarmCategory; 4] = [
    HarmCategory::Harassment,
    HarmCategory::HateSpeech,
    HarmCategory::SexuallyExplicit,
    HarmCategory::DangerousContent,
];

/// Gemini text generation through Vertex AI.
pub struct VertexTextClient {
    http: VertexHttpClient,
}

impl VertexTextClient {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            http: VertexHttpClient::new(config, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            safety_settings: MODERATED_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: HarmBlockThreshold::BlockMediumAndAbove,
                })
                .collect(),
        }
    }
}

/// Text of one fragment, or `""` when it has none (e.g. withheld by a
/// safety threshold).
fn fragment_text(fragment: &GenerateContentResponse) -> String {
    fragment.text().unwrap_or_else(|| {
        tracing::warn!(
            "Text fragment had no extractable text: {}",
            fragment.empty_reason()
        );
        String::new()
    })
}

/// Join fragments with single spaces in arrival order. Yields `""` when no
/// fragment carried any text.
fn assemble(fragments: Vec<String>) -> String {
    if fragments.iter().all(|f| f.is_empty()) {
        String::new()
    } else {
        fragments.join(" ")
    }
}

#[async_trait]
impl TextGenerationService for VertexTextClient {
    async fn generate_text(&self, prompt: &str, stream: bool) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation(
                "Text generation prompt must not be empty".to_string(),
            ));
        }

        let request = Self::build_request(prompt);

        let fragments = if stream {
            let mut chunks = self.http.stream_generate_content(&request).await?;
            let mut fragments = Vec::new();
            while let Some(chunk) = chunks.next().await {
                fragments.push(fragment_text(&chunk?));
            }
            fragments
        } else {
            let response = self.http.generate_content(&request).await?;
            vec![fragment_text(&response)]
        };

        tracing::debug!(
            "Assembled {} text fragment(s) from {}",
            fragments.len(),
            self.http.model()
        );
        Ok(assemble(fragments))
    }
}
