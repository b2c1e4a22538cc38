//! Test: Research Flow - researcher -> editor with optional web search

use crate::helpers::*;
use crew_pipeline::core::{RunState, StepError};
use crew_pipeline::pipelines::research::{EDITOR, RESEARCHER};
use crew_pipeline::pipelines::{PipelineSettings, ResearchPipeline, ResearchRequest};
use crew_pipeline::search::SearchError;
use std::sync::Arc;

const PASSAGE: &str = "La capacidad solar instalada se duplicó en cinco años, mientras que \
la eólica marina empieza a competir en precio con el gas. Las redes eléctricas, sin embargo, \
no crecen al mismo ritmo y el almacenamiento sigue siendo caro.";

const REPORT: &str = "# Energía Renovable\n\n## Resumen Ejecutivo\nEl sector crece rápido.\n\n\
## Vías de Acción Sugeridas\n1. Invertir en redes.\n2. Subastar almacenamiento.\n3. Formar técnicos.";

fn pipeline() -> ResearchPipeline {
    ResearchPipeline::new(&PipelineSettings::default()).unwrap()
}

/// Content-only research returns the editor's output unchanged
#[tokio::test]
async fn test_research_end_to_end() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());
    let request = ResearchRequest::new("Renewable Energy").with_content(PASSAGE);

    let run = pipeline().execute(&runner, &request).await.unwrap();

    assert_run_completed(&run, REPORT);
    assert_eq!(model.calls(), 2);

    let requests = model.requests();
    assert!(requests[0].user.contains("'Renewable Energy'"));
    assert!(requests[0].user.contains(PASSAGE));
    assert!(requests[0].user.contains("No hay resultados de búsqueda web"));
    assert!(requests[0].system.contains("Investigador"));

    // The editor reads the draft and is reminded of both sections
    assert!(requests[1].user.contains(REPORT));
    assert!(requests[1].user.contains("Resumen Ejecutivo"));
    assert!(requests[1].user.contains("Vías de Acción Sugeridas"));
    assert_eq!(requests[1].model_id, "gpt-3.5-turbo-0125");
    assert_eq!(requests[0].max_tokens, 2500);
}

/// Without content and without search nothing is invoked
#[tokio::test]
async fn test_missing_content_without_search() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &ResearchRequest::new("Renewable Energy"))
        .await
        .unwrap_err();

    assert_eq!(err.step, RESEARCHER);
    assert!(matches!(err.cause, StepError::MissingInput(_)));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_blank_topic_rejected() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());

    let err = pipeline()
        .run(&runner, &ResearchRequest::new("  ").with_content(PASSAGE))
        .await
        .unwrap_err();

    assert_eq!(err.cause, StepError::MissingInput("topic".to_string()));
    assert_eq!(model.calls(), 0);
}

/// Search hits are spliced into the researcher prompt
#[tokio::test]
async fn test_search_results_reach_researcher() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());
    let search = Arc::new(MockSearch::ok(vec![
        search_result("Solar Outlook", "La solar lidera la nueva capacidad."),
        search_result("Wind Report", "La eólica marina abarata costes."),
    ]));
    let pipeline = pipeline().with_search(search.clone());
    assert!(pipeline.has_search());

    let report = pipeline
        .run(&runner, &ResearchRequest::new("Renewable Energy"))
        .await
        .unwrap();

    assert_eq!(report, REPORT);
    assert_eq!(search.queries(), vec!["Renewable Energy"]);

    let researcher_prompt = &model.requests()[0].user;
    assert!(researcher_prompt.contains("1. Solar Outlook (https://example.org/solar-outlook)"));
    assert!(researcher_prompt.contains("La eólica marina abarata costes."));
    assert!(researcher_prompt.contains("Sin contenido adicional proporcionado."));
}

#[tokio::test]
async fn test_search_result_limit() {
    let mut settings = PipelineSettings::default();
    settings.research.max_search_results = 1;
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());
    let search = Arc::new(MockSearch::ok(vec![
        search_result("First", "primero"),
        search_result("Second", "segundo"),
    ]));

    ResearchPipeline::new(&settings)
        .unwrap()
        .with_search(search)
        .run(&runner, &ResearchRequest::new("t"))
        .await
        .unwrap();

    let researcher_prompt = &model.requests()[0].user;
    assert!(researcher_prompt.contains("primero"));
    assert!(!researcher_prompt.contains("segundo"));
}

/// A failed search falls back to the supplied content
#[tokio::test]
async fn test_search_failure_falls_back_to_content() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());
    let search = Arc::new(MockSearch::failing(SearchError::Transport("dns".to_string())));

    let report = pipeline()
        .with_search(search.clone())
        .run(&runner, &ResearchRequest::new("t").with_content(PASSAGE))
        .await
        .unwrap();

    assert_eq!(report, REPORT);
    assert_eq!(search.queries().len(), 1);
    let researcher_prompt = &model.requests()[0].user;
    assert!(researcher_prompt.contains(PASSAGE));
    assert!(researcher_prompt.contains("No hay resultados de búsqueda web"));
}

/// A failed search with nothing to fall back on fails the researcher step
#[tokio::test]
async fn test_search_failure_without_content() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT, REPORT]));
    let runner = runner_with(model.clone());
    let error = SearchError::Http {
        status: 401,
        message: "invalid api key".to_string(),
    };
    let search = Arc::new(MockSearch::failing(error.clone()));

    let err = pipeline()
        .with_search(search)
        .run(&runner, &ResearchRequest::new("t"))
        .await
        .unwrap_err();

    assert_eq!(err.step, RESEARCHER);
    assert_eq!(err.cause, StepError::Search(error));
    assert_eq!(model.calls(), 0);
}

/// An editor failure keeps the draft but yields no report
#[tokio::test]
async fn test_editor_failure() {
    let model = Arc::new(ScriptedModel::new(vec![REPORT]));
    let runner = runner_with(model.clone());

    let run = pipeline()
        .execute(&runner, &ResearchRequest::new("t").with_content(PASSAGE))
        .await
        .unwrap();

    assert_run_failed_at(&run, 1, EDITOR);
    assert_eq!(run.step_output(RESEARCHER), Some(REPORT));
    assert_eq!(run.state, RunState::Failed(1));
}
