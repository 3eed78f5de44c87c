use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::models::Config;
use crate::{Error, Result};
use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Response};

/// Lightweight Vertex AI REST client for publisher (Gemini) models.
pub struct VertexHttpClient {
    client: Client,
    access_token: Option<String>,
    project: String,
    region: String,
    model: String,
    base_url: String,
}

impl VertexHttpClient {
    pub fn new(config: &Config, client: Client) -> Self {
        let model = config
            .text_model
            .strip_prefix("models/")
            .unwrap_or(&config.text_model)
            .to_string();

        Self {
            client,
            access_token: config.gcp_access_token.clone(),
            project: config.gcp_project.clone(),
            region: config.gcp_region.clone(),
            model,
            base_url: config
                .vertex_base_url
                .clone()
                .unwrap_or_else(|| default_base_url(&config.gcp_region)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            self.project,
            self.region,
            self.model,
            method
        )
    }

    async fn send(&self, url: &str, request: &GenerateContentRequest) -> Result<Response> {
        tracing::debug!("Sending request to Vertex AI model {}", self.model);

        let mut builder = self.client.post(url).json(request);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to Vertex AI: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Vertex AI error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Vertex AI error (status {}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Calls `generateContent`; the whole answer arrives as one response.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self.send(&self.model_url("generateContent"), request).await?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Vertex AI response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Vertex AI response: {}", e))
        })
    }

    /// Calls `streamGenerateContent` over server-sent events, yielding one
    /// response per event in arrival order.
    pub async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<BoxStream<'static, Result<GenerateContentResponse>>> {
        let url = format!("{}?alt=sse", self.model_url("streamGenerateContent"));
        let response = self.send(&url, request).await?;

        let fragments = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(
                        serde_json::from_str::<GenerateContentResponse>(&event.data).map_err(
                            |e| {
                                tracing::error!(
                                    "Failed to parse Vertex AI stream chunk: {}\nData: {}",
                                    e,
                                    event.data
                                );
                                Error::AiProvider(format!(
                                    "Failed to parse Vertex AI stream chunk: {}",
                                    e
                                ))
                            },
                        ),
                    ),
                    Err(EventStreamError::Transport(e)) => {
                        tracing::error!("Vertex AI stream interrupted: {}", e);
                        Some(Err(Error::Http(e)))
                    }
                    Err(e) => Some(Err(Error::AiProvider(format!(
                        "Invalid event stream from Vertex AI: {}",
                        e
                    )))),
                }
            });

        Ok(fragments.boxed())
    }
}

fn default_base_url(region: &str) -> String {
    format!("https://{}-aiplatform.googleapis.com", region)
}
