//! Test: Marketing Flow - ideas -> post -> image prompt -> optional image

use crate::helpers::*;
use crew_pipeline::core::StepError;
use crew_pipeline::execution::{CancellationFlag, RunEvent};
use crew_pipeline::model::ModelError;
use crew_pipeline::pipelines::marketing::{IDEAS, IMAGE_PROMPT, POST};
use crew_pipeline::pipelines::{MarketingPipeline, MarketingRequest, PipelineSettings};
use std::sync::Arc;

const IDEAS_REPLY: &str = "- Caso de éxito de un cliente\n- Detrás de cámaras del equipo\n\
- Encuesta sobre trabajo híbrido\n- Guía de productividad\n- Webinar con expertos";
const POST_REPLY: &str = "Nuestra oficina se reinventa para el trabajo híbrido. \
Descubre cómo lo hicimos y cuéntanos tu experiencia. #TrabajoHíbrido";
const IMAGE_PROMPT_REPLY: &str = "\"a bright office scene\"";

fn pipeline() -> MarketingPipeline {
    MarketingPipeline::new(&PipelineSettings::default()).unwrap()
}

fn scripted() -> Arc<ScriptedModel> {
    Arc::new(ScriptedModel::new(vec![IDEAS_REPLY, POST_REPLY, IMAGE_PROMPT_REPLY]))
}

/// Quotes around the image prompt are stripped
#[tokio::test]
async fn test_marketing_end_to_end() {
    let model = scripted();
    let runner = runner_with(model.clone());

    let content = pipeline()
        .run(&runner, &MarketingRequest::new("Oficina híbrida", "LinkedIn"))
        .await
        .unwrap();

    assert_eq!(content.ideas, IDEAS_REPLY);
    assert_eq!(content.post_text, POST_REPLY);
    assert_eq!(content.image_prompt, "a bright office scene");
    assert_eq!(content.image_url, None);
    assert_eq!(model.calls(), 3);

    let requests = model.requests();
    assert!(requests[0].user.contains("'Oficina híbrida'"));
    assert!(requests[0].user.contains("No se proporcionó contexto adicional."));
    assert!(requests[1].user.contains(IDEAS_REPLY));
    assert!(requests[1].user.contains("'LinkedIn'"));
    assert!(requests[1].user.contains("profesional"));
    assert!(requests[2].user.contains(POST_REPLY));
    assert!(requests[2].system.contains("Director de Arte"));
}

#[tokio::test]
async fn test_platform_is_normalized() {
    let model = scripted();
    let runner = runner_with(model.clone());

    pipeline()
        .run(
            &runner,
            &MarketingRequest::new("café", "instagram").with_context("Tostadores locales"),
        )
        .await
        .unwrap();

    let post_prompt = &model.requests()[1].user;
    assert!(post_prompt.contains("'Instagram'"));
    assert!(post_prompt.contains("casual/visual"));
    assert!(post_prompt.contains("Tostadores locales"));
}

/// An unsupported platform is rejected before any model call
#[tokio::test]
async fn test_unsupported_platform() {
    let model = scripted();
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &MarketingRequest::new("café", "MySpace"))
        .await
        .unwrap_err();

    assert_eq!(err.step, POST);
    assert!(matches!(&err.cause, StepError::InvalidInput(m) if m.contains("MySpace")));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_blank_topic() {
    let model = scripted();
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &MarketingRequest::new(" ", "LinkedIn"))
        .await
        .unwrap_err();

    assert_eq!(err.step, IDEAS);
    assert_eq!(model.calls(), 0);
}

/// A failing post step fails the request
#[tokio::test]
async fn test_post_failure() {
    let model = Arc::new(ScriptedModel::from_results(vec![
        Ok(IDEAS_REPLY.to_string()),
        Err(ModelError::RateLimited("slow down".to_string())),
    ]));
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &MarketingRequest::new("café", "Facebook"))
        .await
        .unwrap_err();

    assert_eq!(err.step, POST);
    assert!(err.cause.is_rate_limited());
    assert_eq!(model.calls(), 2);
}

/// The unquoted image prompt is sent to the image generator
#[tokio::test]
async fn test_image_generation() {
    let model = scripted();
    let images = Arc::new(MockImages::ok("https://images.example.org/office.png"));
    let runner = runner_with_images(model.clone(), images.clone());

    let content = pipeline()
        .run(&runner, &MarketingRequest::new("café", "X").with_image(true))
        .await
        .unwrap();

    assert_eq!(
        content.image_url.as_deref(),
        Some("https://images.example.org/office.png")
    );
    assert_eq!(images.prompts(), vec!["a bright office scene"]);
    assert_eq!(model.calls(), 3);
}

/// Without an image generator the image is skipped
#[tokio::test]
async fn test_image_requested_without_generator() {
    let model = scripted();
    let runner = runner_with(model.clone());

    let content = pipeline()
        .run(&runner, &MarketingRequest::new("café", "General").with_image(true))
        .await
        .unwrap();

    assert_eq!(content.image_url, None);
    assert_eq!(content.image_prompt, "a bright office scene");
}

/// A failed image generation keeps the text content
#[tokio::test]
async fn test_image_failure_keeps_text() {
    let model = scripted();
    let images = Arc::new(MockImages::failing(ModelError::TransportFailure(
        "503".to_string(),
    )));
    let runner = runner_with_images(model.clone(), images.clone());

    let content = pipeline()
        .run(&runner, &MarketingRequest::new("café", "LinkedIn").with_image(true))
        .await
        .unwrap();

    assert_eq!(content.image_url, None);
    assert_eq!(content.post_text, POST_REPLY);
    assert_eq!(images.prompts().len(), 1);

    let json = serde_json::to_value(&content).unwrap();
    assert!(json.get("image_url").is_none());
}

/// A reply that is only quotes has no usable content
#[tokio::test]
async fn test_quoted_empty_image_prompt_fails() {
    let model = Arc::new(ScriptedModel::new(vec![IDEAS_REPLY, POST_REPLY, "\"\""]));
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &MarketingRequest::new("café", "LinkedIn"))
        .await
        .unwrap_err();

    assert_eq!(err.step, IMAGE_PROMPT);
    assert_eq!(err.cause, StepError::Model(ModelError::EmptyResponse));
    assert_eq!(model.calls(), 3);
}

/// A stop signal before the image step keeps the finished text
#[tokio::test]
async fn test_cancelled_before_image_keeps_text() {
    let model = scripted();
    let images = Arc::new(MockImages::ok("https://images.example.org/office.png"));
    let shutdown = CancellationFlag::new();
    let trigger = shutdown.clone();
    let runner = runner_with_images(model.clone(), images.clone())
        .with_shutdown(shutdown)
        .with_event_handler(move |event| {
            if matches!(event, RunEvent::StepCompleted { index: 2, .. }) {
                trigger.cancel();
            }
        });

    let content = pipeline()
        .run(&runner, &MarketingRequest::new("café", "LinkedIn").with_image(true))
        .await
        .unwrap();

    assert_eq!(content.image_prompt, "a bright office scene");
    assert_eq!(content.post_text, POST_REPLY);
    assert_eq!(content.image_url, None);
    assert!(images.prompts().is_empty());
}

/// A stop signal before the text is finished still fails the request
#[tokio::test]
async fn test_cancelled_before_post_fails() {
    let model = scripted();
    let shutdown = CancellationFlag::new();
    let trigger = shutdown.clone();
    let runner = runner_with(model.clone())
        .with_shutdown(shutdown)
        .with_event_handler(move |event| {
            if matches!(event, RunEvent::StepCompleted { index: 0, .. }) {
                trigger.cancel();
            }
        });

    let err = pipeline()
        .run(&runner, &MarketingRequest::new("café", "LinkedIn").with_image(true))
        .await
        .unwrap_err();

    assert_eq!(err.step, POST);
    assert_eq!(err.cause, StepError::Cancelled);
    assert_eq!(model.calls(), 1);
}
