//! Persistence layer: report documents and semantic memory

pub mod documents;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod store;

pub use documents::LocalDocumentStore;
pub use memory::{lexical_distance, InMemoryMemory};
#[cfg(feature = "sqlite")]
pub use store::SqliteMemory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata attached to a memory record
pub type Metadata = BTreeMap<String, String>;

/// A document persisted by a `DocumentStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub view_link: String,
}

/// Trait for document storage backends
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a Markdown document under the given name
    async fn store(&self, content: &str, name: &str) -> Result<StoredDocument>;
}

/// A record to add to semantic memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

/// A memory record ranked against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatch {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Cosine distance in `0.0..=1.0`; lower is closer
    pub distance: f64,
}

impl MemoryMatch {
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// Trait for semantic memory backends
///
/// Records are append-only; ids are chosen by the caller.
#[async_trait::async_trait]
pub trait VectorMemory: Send + Sync {
    /// Add a record and return its id
    async fn upsert(&self, record: MemoryRecord) -> Result<String>;

    /// Closest records whose metadata contains every `filter` entry
    async fn query_where(
        &self,
        text: &str,
        top_k: usize,
        filter: &Metadata,
    ) -> Result<Vec<MemoryMatch>>;

    /// Closest records to `text`, nearest first
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<MemoryMatch>> {
        self.query_where(text, top_k, &Metadata::new()).await
    }
}

/// Rank candidate records against a query
pub(crate) fn rank(
    text: &str,
    top_k: usize,
    filter: &Metadata,
    records: impl IntoIterator<Item = MemoryRecord>,
) -> Vec<MemoryMatch> {
    let mut matches: Vec<MemoryMatch> = records
        .into_iter()
        .filter(|r| filter.iter().all(|(k, v)| r.metadata.get(k) == Some(v)))
        .map(|r| MemoryMatch {
            distance: lexical_distance(text, &r.document),
            id: r.id,
            document: r.document,
            metadata: r.metadata,
        })
        .collect();

    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    matches.truncate(top_k);
    matches
}
