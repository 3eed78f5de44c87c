//! Story generation orchestration.
//!
//! One generation is a short linear pipeline: story prompt, story text,
//! image-description prompt, image description, image URL. An empty result
//! at any awaited stage ends the run in [`GenerationState::Skipped`].

use crate::ai::{
    ImageGenerationService, OpenAiImageClient, TextGenerationService, VertexTextClient,
};
use crate::models::{Config, FormState};
use crate::{prompts, Result};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    BuildingStoryPrompt,
    AwaitingStoryText,
    BuildingImagePrompt,
    AwaitingImageDescription,
    AwaitingImageUrl,
    Done,
    Skipped,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Done | GenerationState::Skipped)
    }
}

/// Receives output as soon as each stage produces it, so earlier output
/// stays shown even if a later stage fails.
pub trait StoryRenderer: Send {
    fn render_story(&mut self, text: &str);
    fn render_image(&mut self, url: &str);
}

/// Renderer that just keeps what it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedStory {
    pub story: Option<String>,
    pub image_url: Option<String>,
}

impl StoryRenderer for RenderedStory {
    fn render_story(&mut self, text: &str) {
        self.story = Some(text.to_string());
    }

    fn render_image(&mut self, url: &str) {
        self.image_url = Some(url.to_string());
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub state: GenerationState,
    pub story: Option<String>,
    pub image_prompt: Option<String>,
    pub image_url: Option<String>,
}

/// Sequences the text and image services for one story request.
pub struct App {
    text: Box<dyn TextGenerationService>,
    image: Box<dyn ImageGenerationService>,
    stream_text: bool,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Box<dyn TextGenerationService>,
    pub image: Box<dyn ImageGenerationService>,
}

#[derive(Default)]
struct Run {
    story_prompt: String,
    story: Option<String>,
    description_prompt: String,
    image_prompt: Option<String>,
    image_url: Option<String>,
}

impl App {
    pub fn with_services(services: AppServices, stream_text: bool) -> Self {
        Self {
            text: services.text,
            image: services.image,
            stream_text,
        }
    }

    /// Construct the app against the real providers described by `config`.
    pub fn new(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        info!(
            "Text provider: Vertex AI (project: {}, region: {}, model: {})",
            config.gcp_project, config.gcp_region, config.text_model
        );
        info!("Image provider: OpenAI (model: {})", config.image_model);

        Self::with_services(
            AppServices {
                text: Box::new(VertexTextClient::new_with_client(
                    config,
                    http_client.clone(),
                )),
                image: Box::new(OpenAiImageClient::new_with_client(config, http_client)),
            },
            config.stream_text,
        )
    }

    /// Run one generation for `form`, pushing output into `renderer` as it
    /// becomes available.
    ///
    /// Invalid forms are rejected before any remote call. A remote failure
    /// aborts the run; anything already rendered stays rendered.
    pub async fn generate(
        &self,
        form: &FormState,
        renderer: &mut dyn StoryRenderer,
    ) -> Result<GenerationOutcome> {
        form.validate()?;

        let span = tracing::info_span!("generation", id = %Uuid::new_v4());
        self.run_pipeline(form, renderer).instrument(span).await
    }

    async fn run_pipeline(
        &self,
        form: &FormState,
        renderer: &mut dyn StoryRenderer,
    ) -> Result<GenerationOutcome> {
        let mut run = Run::default();
        let mut state = GenerationState::Idle;

        while !state.is_terminal() {
            let next = self.step(state, form, &mut run, renderer).await?;
            debug!("{:?} -> {:?}", state, next);
            state = next;
        }

        info!("Generation finished in state {:?}", state);
        Ok(GenerationOutcome {
            state,
            story: run.story,
            image_prompt: run.image_prompt,
            image_url: run.image_url,
        })
    }

    async fn step(
        &self,
        state: GenerationState,
        form: &FormState,
        run: &mut Run,
        renderer: &mut dyn StoryRenderer,
    ) -> Result<GenerationState> {
        use GenerationState::*;

        let next = match state {
            Idle => BuildingStoryPrompt,
            BuildingStoryPrompt => {
                run.story_prompt = prompts::build_story_prompt(form);
                AwaitingStoryText
            }
            AwaitingStoryText => {
                info!("Generating story text");
                let story = self
                    .text
                    .generate_text(&run.story_prompt, self.stream_text)
                    .await?;
                if story.trim().is_empty() {
                    info!("Story text came back empty; skipping illustration");
                    Skipped
                } else {
                    renderer.render_story(&story);
                    run.story = Some(story);
                    BuildingImagePrompt
                }
            }
            BuildingImagePrompt => {
                let story = run.story.as_deref().unwrap_or_default();
                run.description_prompt = prompts::build_image_prompt(story);
                AwaitingImageDescription
            }
            AwaitingImageDescription => {
                info!("Generating image description");
                let description = self
                    .text
                    .generate_text(&run.description_prompt, self.stream_text)
                    .await?;
                info!("Image prompt: {}", description);
                if description.trim().is_empty() {
                    Skipped
                } else {
                    run.image_prompt = Some(description);
                    AwaitingImageUrl
                }
            }
            AwaitingImageUrl => {
                let description = run.image_prompt.as_deref().unwrap_or_default();
                if let Some(url) = self.image.generate_image(description).await? {
                    renderer.render_image(&url);
                    run.image_url = Some(url);
                } else {
                    info!("No image URL returned; nothing to show");
                }
                Done
            }
            Done | Skipped => state,
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockImageGenerationClient, MockTextGenerationClient};
    use crate::models::{Character, CharacterKind, StoryGenre, StoryLocation};
    use crate::Error;
    use pretty_assertions::assert_eq;

    const STORY: &str = "Ada and Nina went to school.\n\nThey found a map.\n\nIt led to the library.\n\nThey read a book.\n\nThey went home happy.";
    const DESCRIPTION: &str = "Two friends reading a treasure map in a school library";

    fn form() -> FormState {
        FormState {
            character1: Character::new("Ada", 7, CharacterKind::Human),
            character2: Character::new("Nina", 5, CharacterKind::Dog),
            location: StoryLocation::School,
            genre: StoryGenre::Adventure,
        }
    }

    fn build_app(text: MockTextGenerationClient, image: MockImageGenerationClient) -> App {
        App::with_services(
            AppServices {
                text: Box::new(text),
                image: Box::new(image),
            },
            true,
        )
    }

    #[tokio::test]
    async fn test_full_run_renders_story_then_image() {
        let text = MockTextGenerationClient::new()
            .with_text_response(STORY)
            .with_text_response(DESCRIPTION);
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new()
            .with_url_response(Some("https://images.test/map.png".to_string()));
        let image_calls = image.clone();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Done);
        assert_eq!(rendered.story.as_deref(), Some(STORY));
        assert_eq!(rendered.image_url.as_deref(), Some("https://images.test/map.png"));
        assert_eq!(outcome.image_prompt.as_deref(), Some(DESCRIPTION));

        let sent = text_calls.prompts();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], prompts::build_story_prompt(&form()));
        assert_eq!(sent[1], prompts::build_image_prompt(STORY));
        assert!(sent[1].contains(STORY));
        assert_eq!(image_calls.prompts(), vec![DESCRIPTION.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_story_skips_everything_after() {
        let text = MockTextGenerationClient::new().with_text_response("");
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new();
        let image_calls = image.clone();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Skipped);
        assert_eq!(rendered, RenderedStory::default());
        assert_eq!(text_calls.get_call_count(), 1);
        assert_eq!(image_calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_image_description_skips_image_call() {
        let text = MockTextGenerationClient::new()
            .with_text_response(STORY)
            .with_text_response("");
        let image = MockImageGenerationClient::new();
        let image_calls = image.clone();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Skipped);
        assert_eq!(rendered.story.as_deref(), Some(STORY));
        assert_eq!(rendered.image_url, None);
        assert_eq!(image_calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_image_description_skips_image_call() {
        let text = MockTextGenerationClient::new()
            .with_text_response(STORY)
            .with_text_response(" \n ");
        let image = MockImageGenerationClient::new();
        let image_calls = image.clone();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Skipped);
        assert_eq!(rendered.story.as_deref(), Some(STORY));
        assert_eq!(outcome.image_prompt, None);
        assert_eq!(image_calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_story_renders_nothing() {
        let text = MockTextGenerationClient::new().with_text_response("\n  ");
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new();
        let image_calls = image.clone();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Skipped);
        assert_eq!(rendered, RenderedStory::default());
        assert_eq!(text_calls.get_call_count(), 1);
        assert_eq!(image_calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_url_still_finishes() {
        let text = MockTextGenerationClient::new()
            .with_text_response(STORY)
            .with_text_response(DESCRIPTION);
        let image = MockImageGenerationClient::new().with_url_response(None);

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let outcome = app.generate(&form(), &mut rendered).await.unwrap();

        assert_eq!(outcome.state, GenerationState::Done);
        assert_eq!(rendered.story.as_deref(), Some(STORY));
        assert_eq!(rendered.image_url, None);
        assert_eq!(outcome.image_url, None);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_rendered_story() {
        let text = MockTextGenerationClient::new()
            .with_text_response(STORY)
            .with_text_response(DESCRIPTION);
        let image = MockImageGenerationClient::new().with_failure("content policy");

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        let err = app.generate(&form(), &mut rendered).await.unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(rendered.story.as_deref(), Some(STORY));
        assert_eq!(rendered.image_url, None);
    }

    #[tokio::test]
    async fn test_story_failure_renders_nothing() {
        let text = MockTextGenerationClient::new().with_failure("unavailable");
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new();

        let app = build_app(text, image);
        let mut rendered = RenderedStory::default();
        assert!(app.generate(&form(), &mut rendered).await.is_err());
        assert_eq!(rendered, RenderedStory::default());
        assert_eq!(text_calls.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_age_blocks_all_remote_calls() {
        for age in [0, 101] {
            let text = MockTextGenerationClient::new();
            let text_calls = text.clone();
            let image = MockImageGenerationClient::new();
            let image_calls = image.clone();
            let app = build_app(text, image);

            let mut invalid = form();
            invalid.character2.age = age;
            let mut rendered = RenderedStory::default();
            let err = app.generate(&invalid, &mut rendered).await.unwrap_err();

            assert!(err.is_validation());
            assert_eq!(text_calls.get_call_count(), 0);
            assert_eq!(image_calls.get_call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_boundary_ages_run() {
        for age in [1, 100] {
            let app = build_app(MockTextGenerationClient::new(), MockImageGenerationClient::new());
            let mut valid = form();
            valid.character1.age = age;
            let mut rendered = RenderedStory::default();
            let outcome = app.generate(&valid, &mut rendered).await.unwrap();
            assert_eq!(outcome.state, GenerationState::Done);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(GenerationState::Done.is_terminal());
        assert!(GenerationState::Skipped.is_terminal());
        assert!(!GenerationState::AwaitingImageUrl.is_terminal());
    }
}
