//! Test: Research Service - report storage and semantic memory

use crate::helpers::*;
use crew_pipeline::persistence::{InMemoryMemory, LocalDocumentStore, VectorMemory};
use crew_pipeline::pipelines::{PipelineSettings, ResearchPipeline, ResearchRequest};
use crew_pipeline::services::ResearchService;
use std::sync::Arc;

const REPORT: &str = "# Hidrógeno\n\n## Resumen Ejecutivo\nEl hidrógeno verde abarata la industria pesada.\n\n\
## Vías de Acción Sugeridas\n1. Electrolizadores.\n2. Ayudas públicas.\n3. Alianzas.";

fn service(replies: Vec<&str>) -> ResearchService {
    let model = Arc::new(ScriptedModel::new(replies));
    let pipeline = ResearchPipeline::new(&PipelineSettings::default()).unwrap();
    ResearchService::new(pipeline, Arc::new(runner_with(model)))
}

fn markdown_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
                .collect()
        })
        .unwrap_or_default()
}

fn request() -> ResearchRequest {
    ResearchRequest::new("Hidrógeno verde").with_content("Notas internas sobre electrolizadores.")
}

/// The report is stored and remembered; a later run finds it
#[tokio::test]
async fn test_conduct_stores_and_remembers() {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(InMemoryMemory::new());
    let service = service(vec![REPORT, REPORT, REPORT, REPORT])
        .with_documents(Arc::new(LocalDocumentStore::new(dir.path())))
        .with_memory(memory.clone());

    let first = service.conduct(&request()).await.unwrap();

    assert_eq!(first.report, REPORT);
    assert_eq!(first.summary, "El hidrógeno verde abarata la industria pesada.");
    assert!(first.related.is_empty());

    let document = first.document.as_ref().expect("report should be stored");
    assert!(document.view_link.starts_with("file://"));
    let files = markdown_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), REPORT);
    let file_name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("InformeEditado_"));

    let memory_id = first.memory_id.clone().expect("report should be remembered");
    assert!(memory_id.starts_with("research_"));
    assert_eq!(memory.len().await, 1);

    let second = service.conduct(&request()).await.unwrap();
    assert_eq!(second.related.len(), 1);
    assert_eq!(second.related[0].id, memory_id);
    assert_eq!(second.related[0].metadata["topic"], "Hidrógeno verde");
    assert_eq!(second.related[0].metadata["store_id"], document.id);
    assert_eq!(memory.len().await, 2);

    let matches = service.query_memory("hidrógeno verde industria", 5).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches[0].document.contains("Contexto original (extracto)"));
}

/// Storage failure does not fail the request, and nothing is remembered
#[tokio::test]
async fn test_storage_failure_is_best_effort() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let memory = Arc::new(InMemoryMemory::new());
    let service = service(vec![REPORT, REPORT])
        .with_documents(Arc::new(LocalDocumentStore::new(blocker.path())))
        .with_memory(memory.clone());

    let outcome = service.conduct(&request()).await.unwrap();

    assert_eq!(outcome.report, REPORT);
    assert!(outcome.document.is_none());
    assert!(outcome.memory_id.is_none());
    assert!(memory.is_empty().await);
}

/// A failed pipeline stores nothing
#[tokio::test]
async fn test_pipeline_failure_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(InMemoryMemory::new());
    let service = service(vec![REPORT])
        .with_documents(Arc::new(LocalDocumentStore::new(dir.path())))
        .with_memory(memory.clone());

    let err = service.conduct(&request()).await.unwrap_err();

    assert_eq!(err.step, "editor");
    assert!(markdown_files(dir.path()).is_empty());
    assert!(memory.is_empty().await);
}

#[tokio::test]
async fn test_without_collaborators() {
    let service = service(vec![REPORT, REPORT]);

    let outcome = service.conduct(&request()).await.unwrap();

    assert!(outcome.document.is_none());
    assert!(outcome.memory_id.is_none());
    assert!(outcome.related.is_empty());
    assert!(service.query_memory("hidrógeno", 3).await.is_err());
}

/// Related research only includes research summaries
#[tokio::test]
async fn test_related_ignores_other_records() {
    let memory = Arc::new(InMemoryMemory::new());
    memory
        .upsert(crew_pipeline::persistence::MemoryRecord {
            id: "note_1".to_string(),
            document: "Hidrógeno verde: nota suelta".to_string(),
            metadata: [("type".to_string(), "note".to_string())].into_iter().collect(),
        })
        .await
        .unwrap();
    let service = service(vec![REPORT, REPORT]).with_memory(memory.clone());

    let outcome = service.conduct(&request()).await.unwrap();

    assert!(outcome.related.is_empty());
    assert_eq!(memory.query("hidrógeno verde", 5).await.unwrap().len(), 1);
}
