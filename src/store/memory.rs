//! In-memory document store
use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Volatile document collection, ordered by key.
///
/// Clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole collection
    pub async fn snapshot(&self) -> BTreeMap<String, Document> {
        self.docs.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, key: &str, doc: Document) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(key) {
            return Err(Error::Store(format!("duplicate key '{}'", key)));
        }
        docs.insert(key.to_string(), doc);
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
        match docs.get_mut(key) {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.docs.write().await.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_keys() {
        let store = MemoryStore::new();
        store.insert("a", doc(json!({"n": 1}))).await.unwrap();
        let err = store.insert("a", doc(json!({"n": 2}))).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(store.find_by_key("a").await.unwrap().unwrap()["n"], 1);
    }

    #[tokio::test]
    async fn replace_and_delete_report_absence() {
        let store = MemoryStore::new();
        assert!(!store.replace("missing", Document::new()).await.unwrap());
        assert!(!store.delete("missing").await.unwrap());

        store.insert("a", doc(json!({"n": 1}))).await.unwrap();
        assert!(store.replace("a", doc(json!({"n": 3}))).await.unwrap());
        assert_eq!(store.find_by_key("a").await.unwrap().unwrap()["n"], 3);
        assert!(store.delete("a").await.unwrap());
        assert!(store.find_by_key("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_ordered_by_key() {
        let store = MemoryStore::new();
        store.insert("b", doc(json!({"k": "b"}))).await.unwrap();
        store.insert("a", doc(json!({"k": "a"}))).await.unwrap();

        let keys: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["k"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn find_by_field_matches_exact_value() {
        let store = MemoryStore::new();
        store.insert("a", doc(json!({"port": 8000}))).await.unwrap();
        assert!(store.find_by_field("port", &json!(8000)).await.unwrap().is_some());
        assert!(store.find_by_field("port", &json!("8000")).await.unwrap().is_none());
        assert!(store.find_by_field("other", &json!(8000)).await.unwrap().is_none());
    }
}
