use super::page::render_page;
use crate::app::{App, RenderedStory};
use crate::form::FormController;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Form;
use std::sync::Arc;
use tracing::{error, warn};

pub async fn show_form() -> Html<String> {
    Html(render_page(
        &FormController::new(),
        &RenderedStory::default(),
        None,
    ))
}

/// Form post: a fresh controller per request keeps sessions independent.
pub async fn generate_story(
    State(app): State<Arc<App>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    let mut controller = FormController::new();
    let mut rendered = RenderedStory::default();

    let applied = controller.apply(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let form = match applied.and_then(|_| controller.submit()) {
        Ok(form) => form,
        Err(e) => {
            warn!("Rejected story form: {}", e);
            let page = render_page(&controller, &rendered, Some(&e.to_string()));
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page));
        }
    };

    match app.generate(&form, &mut rendered).await {
        Ok(_) => (
            StatusCode::OK,
            Html(render_page(&controller, &rendered, None)),
        ),
        Err(e) => {
            error!("Story generation failed: {}", e);
            let message = format!("Story generation failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Html(render_page(&controller, &rendered, Some(&message))),
            )
        }
    }
}

pub async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use crate::ai::{MockImageGenerationClient, MockTextGenerationClient};
    use crate::app::{App, AppServices};
    use crate::web::router;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    const FORM_BODY: &str = "character1_name=Ada&character1_age=7&character1_type=Human\
        &character2_name=Nina&character2_age=5&character2_type=Dog\
        &story_location=School&story_type=Adventure";

    fn build_router(
        text: MockTextGenerationClient,
        image: MockImageGenerationClient,
    ) -> axum::Router {
        router(Arc::new(App::with_services(
            AppServices {
                text: Box::new(text),
                image: Box::new(image),
            },
            true,
        )))
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let app = build_router(MockTextGenerationClient::new(), MockImageGenerationClient::new());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Generate my story"));
        assert!(html.contains("value=\"Ada\""));
    }

    #[tokio::test]
    async fn test_generate_renders_story_and_image() {
        let text = MockTextGenerationClient::new()
            .with_text_response("Ada and her dog Nina explored the school.")
            .with_text_response("A girl and a dog in a school hallway");
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new()
            .with_url_response(Some("https://images.test/hall.png".to_string()));

        let response = build_router(text, image)
            .oneshot(post_form(FORM_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<p>Ada and her dog Nina explored the school.</p>"));
        assert!(html.contains("src=\"https://images.test/hall.png\""));
        assert!(html.contains("<option selected>Dog</option>"));
        assert!(text_calls.prompts()[0].contains("character2_type: Dog"));
    }

    #[tokio::test]
    async fn test_invalid_age_is_rejected_before_generation() {
        let text = MockTextGenerationClient::new();
        let text_calls = text.clone();
        let image = MockImageGenerationClient::new();
        let image_calls = image.clone();

        let body = FORM_BODY.replace("character1_age=7", "character1_age=101");
        let response = build_router(text, image)
            .oneshot(post_form(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("between 1 and 100"));
        assert_eq!(text_calls.get_call_count(), 0);
        assert_eq!(image_calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_story_on_page() {
        let text = MockTextGenerationClient::new()
            .with_text_response("A short tale.")
            .with_text_response("A picture prompt");
        let image = MockImageGenerationClient::new().with_failure("billing limit reached");

        let response = build_router(text, image)
            .oneshot(post_form(FORM_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = body_text(response).await;
        assert!(html.contains("<p>A short tale.</p>"));
        assert!(html.contains("billing limit reached"));
        assert!(!html.contains("class=\"illustration\""));
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = build_router(MockTextGenerationClient::new(), MockImageGenerationClient::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }
}
