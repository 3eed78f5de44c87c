use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::ImageGenerationService;
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;

pub const IMAGE_SIZE: &str = "1024x1024";
pub const IMAGE_QUALITY: &str = "standard";

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, reqwest::Client::new())
    }

    pub fn new_with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new(config, client),
            model: config.image_model.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation(
                "Image generation prompt must not be empty".to_string(),
            ));
        }

        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
            quality: IMAGE_QUALITY.to_string(),
        };

        tracing::debug!("Requesting image from OpenAI model {}", self.model);
        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image = response.data.into_iter().next();
        if let Some(revised) = image.as_ref().and_then(|i| i.revised_prompt.as_deref()) {
            tracing::debug!("OpenAI revised image prompt: {}", revised);
        }

        let url = image.and_then(|i| i.url).filter(|u| !u.trim().is_empty());
        if url.is_none() {
            tracing::warn!("OpenAI returned no image URL");
        }
        Ok(url)
    }
}
