//! SQLite-backed semantic memory

use crate::persistence::{rank, Metadata, MemoryMatch, MemoryRecord, VectorMemory};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;
use tracing::debug;

/// SQLite memory store
///
/// Documents and metadata are persisted. Metadata filters run in SQL;
/// ranking happens in process with the same lexical distance as
/// `InMemoryMemory`.
pub struct SqliteMemory {
    pool: SqlitePool,
}

impl SqliteMemory {
    /// Open (or create) a database file
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        Self::new(data_dir.join("crew-pipeline").join("memory.db")).await
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
            CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(json_extract(metadata, '$.type'));
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM memories")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count memories")?;
        Ok(row.get::<i64, _>("n") as usize)
    }
}

#[async_trait::async_trait]
impl VectorMemory for SqliteMemory {
    async fn upsert(&self, record: MemoryRecord) -> Result<String> {
        if record.document.trim().is_empty() {
            bail!("memory record '{}' has an empty document", record.id);
        }

        let metadata = serde_json::to_string(&record.metadata)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO memories (id, document, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&record.id)
        .bind(&record.document)
        .bind(metadata)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save memory record")?;

        debug!("Stored memory record {}", record.id);
        Ok(record.id)
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

        let mut query = filtered_select(filter);
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to load memory records")?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(MemoryRecord {
                    id: row.get("id"),
                    document: row.get("document"),
                    metadata: serde_json::from_str(&row.get::<String, _>("metadata"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(rank(text, top_k, filter, records))
    }
}

/// `SELECT` over the records whose metadata holds every `filter` entry
fn filtered_select(filter: &Metadata) -> QueryBuilder<'_, Sqlite> {
    let mut query = QueryBuilder::new("SELECT id, document, metadata FROM memories");

    for (i, (key, value)) in filter.iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        // Plain keys are inlined so the expression index on `type` applies
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            query.push(format!("json_extract(metadata, '$.{}') = ", key));
        } else {
            query.push("json_extract(metadata, ");
            query.push_bind(format!("$.\"{}\"", key.replace('"', "")));
            query.push(") = ");
        }
        query.push_bind(value.as_str());
    }

    query
}
