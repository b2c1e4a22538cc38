//! In-memory semantic memory and the lexical distance it ranks by

use crate::persistence::{rank, Metadata, MemoryMatch, MemoryRecord, VectorMemory};
use anyhow::{bail, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *counts.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine distance between the term-frequency vectors of two texts
///
/// Returns `1.0` when either text has no terms.
pub fn lexical_distance(a: &str, b: &str) -> f64 {
    let a = term_frequencies(a);
    let b = term_frequencies(b);
    if a.is_empty() || b.is_empty() {
        return 1.0;
    }

    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();

    (1.0 - dot / (norm(&a) * norm(&b))).clamp(0.0, 1.0)
}

/// In-memory memory (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryMemory {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl VectorMemory for InMemoryMemory {
    async fn upsert(&self, record: MemoryRecord) -> Result<String> {
        if record.document.trim().is_empty() {
            bail!("memory record '{}' has an empty document", record.id);
        }

        let mut records = self.records.write().await;
        let id = record.id.clone();
        match records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        debug!("Stored memory record {}", id);
        Ok(id)
    }

    async fn query_where(
        &self,
        text: &str,
        top_k: usize,
        filter: &Metadata,
    ) -> Result<Vec<MemoryMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        Ok(rank(text, top_k, filter, records.iter().cloned()))
    }
}
