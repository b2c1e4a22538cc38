//! Research service: run the pipeline, store the report and remember it

use crate::{
    core::PipelineError,
    execution::PipelineRunner,
    persistence::{DocumentStore, MemoryMatch, MemoryRecord, Metadata, StoredDocument, VectorMemory},
    pipelines::{
        research::{ACTIONS_HEADING, SUMMARY_HEADING},
        ResearchPipeline, ResearchRequest,
    },
    services::naming::report_file_name,
};
use chrono::{Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default number of related past reports returned
pub const DEFAULT_RELATED_TOP_K: usize = 5;

const SUMMARY_MAX_CHARS: usize = 1000;
const PREVIEW_CHARS: usize = 500;
const MEMORY_TYPE: &str = "research_summary";
const MEMORY_SOURCE: &str = "ResearchAgent";

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Short summary of a report for semantic memory
///
/// The executive summary section when present, otherwise the first 500
/// characters followed by `...`.
pub fn summarize_report(report: &str) -> String {
    let heading = format!("## {}", SUMMARY_HEADING);
    if let Some(start) = report.find(&heading) {
        let rest = &report[start + heading.len()..];
        let end = rest
            .find(&format!("## {}", ACTIONS_HEADING))
            .unwrap_or(rest.len());
        let section = rest[..end].trim();
        if !section.is_empty() {
            return truncate_chars(section, SUMMARY_MAX_CHARS).to_string();
        }
    }
    format!("{}...", truncate_chars(report.trim(), PREVIEW_CHARS))
}

/// Memory record describing one stored research report
pub fn research_record(
    topic: &str,
    summary: &str,
    content_preview: Option<&str>,
    document: &StoredDocument,
) -> MemoryRecord {
    let mut text = format!("Tema: {}\nResumen: {}", topic, summary);
    if let Some(preview) = content_preview.map(str::trim).filter(|p| !p.is_empty()) {
        text.push_str(&format!(
            "\nContexto original (extracto): {}...",
            truncate_chars(preview, PREVIEW_CHARS)
        ));
    }

    let metadata: Metadata = [
        ("topic", topic.to_string()),
        ("source", MEMORY_SOURCE.to_string()),
        ("store_id", document.id.clone()),
        ("store_link", document.view_link.clone()),
        ("type", MEMORY_TYPE.to_string()),
        ("timestamp", Utc::now().to_rfc3339()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    MemoryRecord {
        id: format!("research_{}", Uuid::new_v4()),
        document: text,
        metadata,
    }
}

/// Everything produced by one research request
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub topic: String,
    pub report: String,
    pub summary: String,
    pub document: Option<StoredDocument>,
    pub memory_id: Option<String>,
    pub related: Vec<MemoryMatch>,
}

/// Runs research and applies the storage and memory policy
///
/// Storage and memory are best effort: their failures are logged and show
/// up as missing fields in the outcome, never as a failed request.
pub struct ResearchService {
    pipeline: ResearchPipeline,
    runner: Arc<PipelineRunner>,
    documents: Option<Arc<dyn DocumentStore>>,
    memory: Option<Arc<dyn VectorMemory>>,
    related_top_k: usize,
}

impl ResearchService {
    pub fn new(pipeline: ResearchPipeline, runner: Arc<PipelineRunner>) -> Self {
        Self {
            pipeline,
            runner,
            documents: None,
            memory: None,
            related_top_k: DEFAULT_RELATED_TOP_K,
        }
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn VectorMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_related_top_k(mut self, top_k: usize) -> Self {
        self.related_top_k = top_k;
        self
    }

    pub async fn conduct(&self, request: &ResearchRequest) -> Result<ResearchOutcome, PipelineError> {
        let report = self.pipeline.run(&self.runner, request).await?;
        let topic = request.topic.trim().to_string();
        info!("Research report ready ({} bytes)", report.len());

        let summary = summarize_report(&report);
        let related = self.related(&topic).await;
        let document = self.store(&topic, &report).await;
        let memory_id = match &document {
            Some(document) => {
                self.remember(&topic, &summary, request.content_to_analyze.as_deref(), document)
                    .await
            }
            None => None,
        };

        Ok(ResearchOutcome {
            topic,
            report,
            summary,
            document,
            memory_id,
            related,
        })
    }

    /// Past research closest to `query`
    pub async fn query_memory(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<MemoryMatch>> {
        match &self.memory {
            Some(memory) => memory.query(query, top_k).await,
            None => anyhow::bail!("semantic memory is not configured"),
        }
    }

    async fn related(&self, topic: &str) -> Vec<MemoryMatch> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };
        let filter: Metadata = [("type".to_string(), MEMORY_TYPE.to_string())]
            .into_iter()
            .collect();

        memory
            .query_where(topic, self.related_top_k, &filter)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to query related research: {:#}", e);
                Vec::new()
            })
    }

    async fn store(&self, topic: &str, report: &str) -> Option<StoredDocument> {
        let documents = self.documents.as_ref()?;
        let name = report_file_name(topic, Local::now());
        match documents.store(report, &name).await {
            Ok(document) => Some(document),
            Err(e) => {
                error!("Failed to store report {}: {:#}", name, e);
                None
            }
        }
    }

    async fn remember(
        &self,
        topic: &str,
        summary: &str,
        content: Option<&str>,
        document: &StoredDocument,
    ) -> Option<String> {
        let memory = self.memory.as_ref()?;
        let record = research_record(topic, summary, content, document);
        match memory.upsert(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Failed to remember report: {:#}", e);
                None
            }
        }
    }
}
