use crate::error::{Error, Result, ValidationErrors};
use crate::server::{Server, ServerData, ServerId};
use crate::store::{Document, DocumentStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key under which a document stores its server ID
const ID_FIELD: &str = "_id";
const PORT_BASE_FIELD: &str = "portBase";

fn server_to_document(server: &Server) -> Result<Document> {
    let value = serde_json::to_value(server)?;
    let Value::Object(mut doc) = value else {
        return Err(Error::Serialization(
            "server did not serialize to an object".to_string(),
        ));
    };
    if let Some(id) = doc.remove("id") {
        doc.insert(ID_FIELD.to_string(), id);
    }
    Ok(doc)
}

fn document_to_server(mut doc: Document) -> Result<Server> {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("id".to_string(), id);
    }
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| Error::Store(format!("Malformed server document: {}", e)))
}

fn port_taken(owner: &Server) -> Error {
    Error::Validation(ValidationErrors::single(
        PORT_BASE_FIELD,
        format!("Port is already used by \"{}\"", owner.name),
    ))
}

/// Server CRUD over a document collection.
///
/// Besides mapping servers to documents, the repository enforces the rule
/// the collection cannot express: no two servers share a base port. All
/// writes go through one async lock, so the uniqueness check and the write
/// that follows cannot interleave with another writer on the same
/// repository.
pub struct ServerRepository {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl ServerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Validate, check the port and persist a new server.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] for invalid fields or a base port already in use
    /// * [`Error::Store`] if the collection fails
    #[tracing::instrument(skip(self, data), fields(port_base = data.port_base))]
    pub async fn create(&self, data: ServerData) -> Result<Server> {
        let server = data.into_server(ServerId::new())?;

        let _write = self.write_lock.lock().await;

        if let Some(existing) = self.get_by_port_base(server.port_base, true).await? {
            tracing::debug!(conflicting_id = %existing.id, "Base port already in use");
            return Err(port_taken(&existing));
        }

        self.store
            .insert(&server.id.to_string(), server_to_document(&server)?)
            .await?;

        tracing::info!(server_id = %server.id, name = %server.name, "Created server");
        Ok(server)
    }

    /// Replace every attribute of an existing server.
    ///
    /// The identity comes from `id`; an `id` inside `data` is ignored.
    ///
    /// # Errors
    ///
    /// * [`Error::ServerNotFound`] if `id` does not exist
    /// * [`Error::Validation`] for invalid fields or a base port used by another server
    #[tracing::instrument(skip(self, data), fields(server_id = %id, port_base = data.port_base))]
    pub async fn update(&self, id: ServerId, data: ServerData) -> Result<Server> {
        let _write = self.write_lock.lock().await;

        self.get_by_id(id, false).await?;

        let server = data.into_server(id)?;

        if let Some(existing) = self.get_by_port_base(server.port_base, true).await? {
            if existing.id != id {
                tracing::debug!(conflicting_id = %existing.id, "Base port already in use");
                return Err(port_taken(&existing));
            }
        }

        let replaced = self
            .store
            .replace(&id.to_string(), server_to_document(&server)?)
            .await?;
        if !replaced {
            return Err(Error::ServerNotFound(id.to_string()));
        }

        tracing::info!(name = %server.name, "Updated server");
        Ok(server)
    }

    /// Look a server up by ID.
    ///
    /// With `tolerant`, absence yields `Ok(None)`; otherwise it is
    /// [`Error::ServerNotFound`].
    pub async fn get_by_id(&self, id: ServerId, tolerant: bool) -> Result<Option<Server>> {
        match self.store.find_by_key(&id.to_string()).await? {
            Some(doc) => Ok(Some(document_to_server(doc)?)),
            None if tolerant => Ok(None),
            None => Err(Error::ServerNotFound(id.to_string())),
        }
    }

    /// Look a server up by ID, failing if it does not exist
    pub async fn get(&self, id: ServerId) -> Result<Server> {
        self.get_by_id(id, false)
            .await?
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))
    }

    /// Look a server up by base port; absence handled as in [`Self::get_by_id`]
    pub async fn get_by_port_base(&self, port_base: u16, tolerant: bool) -> Result<Option<Server>> {
        match self
            .store
            .find_by_field(PORT_BASE_FIELD, &Value::from(port_base))
            .await?
        {
            Some(doc) => Ok(Some(document_to_server(doc)?)),
            None if tolerant => Ok(None),
            None => Err(Error::ServerNotFound(format!("port base {}", port_base))),
        }
    }

    /// All servers, in store order
    pub async fn list(&self) -> Result<Vec<Server>> {
        self.store
            .list()
            .await?
            .into_iter()
            .map(document_to_server)
            .collect()
    }

    /// Delete a server.
    ///
    /// # Errors
    ///
    /// * [`Error::ServerNotFound`] if `id` does not exist
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn remove(&self, id: ServerId) -> Result<()> {
        let _write = self.write_lock.lock().await;

        if !self.store.delete(&id.to_string()).await? {
            return Err(Error::ServerNotFound(id.to_string()));
        }

        tracing::info!("Removed server");
        Ok(())
    }
}
