//! Document store persisted as a single JSON file
use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Document collection kept in memory and written through to disk.
///
/// The file holds one JSON object mapping keys to documents. Every
/// mutation rewrites it through a temporary sibling file and a rename, so
/// a crash never leaves a half-written collection behind. A mutation whose
/// write fails is rolled back in memory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    docs: Arc<RwLock<BTreeMap<String, Document>>>,
}

impl JsonFileStore {
    /// Open the collection at `path`; a missing file is an empty collection
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let docs = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("Failed to parse store file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Store file not found, starting with an empty collection");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(Error::Store(format!(
                    "Failed to read store file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!(documents = docs.len(), "Opened document store");
        Ok(Self {
            path,
            docs: Arc::new(RwLock::new(docs)),
        })
    }

    async fn persist(&self, docs: &BTreeMap<String, Document>) -> Result<()> {
        let content = serde_json::to_vec_pretty(docs)?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Error::Store(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            Error::Store(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        tracing::trace!(documents = docs.len(), "Persisted document store");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, key: &str, doc: Document) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(key) {
            return Err(Error::Store(format!("duplicate key '{}'", key)));
        }

        docs.insert(key.to_string(), doc);
        if let Err(e) = self.persist(&docs).await {
            docs.remove(key);
            return Err(e);
        }
        Ok(())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Document>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Option<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .find(|doc| doc.get(field) == Some(value))
            .cloned())
    }

    async fn replace(&self, key: &str, doc: Document) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let Some(previous) = docs.insert(key.to_string(), doc) else {
            docs.remove(key);
            return Ok(false);
        };

        if let Err(e) = self.persist(&docs).await {
            docs.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let Some(previous) = docs.remove(key) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&docs).await {
            docs.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().await.values().cloned().collect())
    }
}
