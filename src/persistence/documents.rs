//! Filesystem document store

use crate::persistence::{DocumentStore, StoredDocument};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Stores reports as Markdown files in a local directory
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the platform data directory
    pub fn with_default_path() -> Self {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(data_dir.join("crew-pipeline").join("reports"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            bail!("document name is empty");
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            bail!("document name '{}' is not a plain file name", name);
        }

        Ok(if name.ends_with(".md") {
            name.to_string()
        } else {
            format!("{}.md", name)
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(&self, content: &str, name: &str) -> Result<StoredDocument> {
        let file_name = Self::file_name(name)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;

        let path = self.root.join(&file_name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let absolute = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        let document = StoredDocument {
            id: Uuid::new_v4().to_string(),
            view_link: format!("file://{}", absolute.display()),
        };

        info!("Stored document {} at {}", document.id, absolute.display());
        Ok(document)
    }
}
