//! Document store module for Galena.
//!
//! Server configurations are persisted in a document collection keyed by
//! server ID. The collection is consumed through the [`DocumentStore`]
//! trait, which only offers single-document primitives; rules spanning
//! several documents (such as port uniqueness) live in the
//! [`ServerRepository`].
//!
//! # Components
//!
//! * `memory` - Volatile in-process collection
//! * `file` - Collection persisted as a single JSON file
//! * `repository` - Server CRUD enforcing validation and port uniqueness
//!
//! # Examples
//!
//! ```
//! use galena::store::{DocumentStore, MemoryStore};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> galena::Result<()> {
//! let store = MemoryStore::new();
//! store.insert("a", json!({ "portBase": 8000 }).as_object().unwrap().clone()).await?;
//!
//! let found = store.find_by_field("portBase", &json!(8000)).await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod file;
pub mod memory;
pub mod repository;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use repository::ServerRepository;

/// A stored document: a JSON object
pub type Document = Map<String, Value>;

/// Key-value document collection.
///
/// Implementations must make each call atomic with respect to the single
/// document it touches. Nothing more is assumed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a new key.
    ///
    /// Fails with [`Error::Store`](crate::Error::Store) if the key is taken.
    async fn insert(&self, key: &str, doc: Document) -> Result<()>;

    /// Find a document by key
    async fn find_by_key(&self, key: &str) -> Result<Option<Document>>;

    /// Find the first document whose top-level `field` equals `value`
    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Option<Document>>;

    /// Replace the document stored under `key`; `false` if there was none
    async fn replace(&self, key: &str, doc: Document) -> Result<bool>;

    /// Delete the document stored under `key`; `false` if there was none
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All documents, in a stable order
    async fn list(&self) -> Result<Vec<Document>>;
}
