/*!
 # Galena

 A Rust library for managing a fleet of SHOUTcast streaming servers.

 ## Overview

 Galena provides functionality to:
 - Keep server configurations (name, base port, passwords, capacity, visibility) in a document store
 - Enforce that every configuration is valid and that no two servers share a base port
 - Turn a stored configuration into a running `sc_serv` process, and stop it again
 - Track which servers have a live process, noticing processes that exit on their own
 - Serve all of the above over an HTTP JSON API

 ## Basic Usage

 ```no_run
 use galena::{Galena, Result};
 use galena::config::ShoutcastSettings;
 use galena::server::{ServerData, ServerManager};
 use galena::store::{MemoryStore, ServerRepository};
 use std::sync::Arc;

 #[tokio::main]
 async fn main() -> Result<()> {
     let repository = ServerRepository::new(Arc::new(MemoryStore::new()));
     let manager = ServerManager::new(ShoutcastSettings::default())?;
     let galena = Galena::new(Arc::new(repository), Arc::new(manager));

     // Create a server configuration
     let view = galena
         .create(
             ServerData::new("Rock FM", 8000)
                 .with_passwords("listen", "admin")
                 .with_max_users(64),
         )
         .await?;

     // Start it, using the stored configuration
     let view = galena.start(view.id()).await?;
     assert!(view.is_running);

     // A running server cannot be changed
     assert!(galena.remove(view.id()).await.is_err());

     galena.stop(view.id()).await?;
     galena.remove(view.id()).await?;
     Ok(())
 }
 ```

 ## Features

 - **Validation**: Field-level violations for invalid server data
 - **Port Uniqueness**: Base ports are unique across the fleet
 - **Process Supervision**: Start, stop and reap SHOUTcast processes
 - **Lifecycle Events**: Subscribe to or query start/stop/exit history
 - **HTTP API**: Actix Web request layer with structured errors
*/

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod shoutcast;
pub mod store;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use server::{Server, ServerData, ServerId, ServerManager, ServerView};
pub use store::ServerRepository;

use server::ServerEvent;
use std::sync::Arc;

/// Coordinate server configurations and their processes
///
/// This struct is the main entry point. It combines the repository and the
/// process manager under one rule: a running server's configuration can be
/// neither changed nor removed. Operations addressing one server hold that
/// server's lifecycle guard for their whole duration.
/// All public methods are instrumented with `tracing` spans.
#[derive(Clone)]
pub struct Galena {
    /// Server configurations
    repository: Arc<ServerRepository>,
    /// Server processes
    manager: Arc<ServerManager>,
}

impl Galena {
    /// Create a coordinator from its two collaborators
    pub fn new(repository: Arc<ServerRepository>, manager: Arc<ServerManager>) -> Self {
        Self {
            repository,
            manager,
        }
    }

    pub fn repository(&self) -> &Arc<ServerRepository> {
        &self.repository
    }

    pub fn manager(&self) -> &Arc<ServerManager> {
        &self.manager
    }

    fn view(&self, server: Server) -> ServerView {
        let is_running = self.manager.is_running(server.id);
        ServerView::new(server, is_running)
    }

    /// All servers with their liveness
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ServerView>> {
        let servers = self.repository.list().await?;
        tracing::debug!(count = servers.len(), "Listed servers");
        Ok(servers.into_iter().map(|s| self.view(s)).collect())
    }

    /// One server with its liveness
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn get(&self, id: ServerId) -> Result<ServerView> {
        let server = self.repository.get(id).await?;
        Ok(self.view(server))
    }

    /// Create a server; new servers are never running
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self, data))]
    pub async fn create(&self, data: ServerData) -> Result<ServerView> {
        let server = self.repository.create(data).await?;
        Ok(ServerView::new(server, false))
    }

    /// Replace a stopped server's configuration
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self, data), fields(server_id = %id))]
    pub async fn update(&self, id: ServerId, data: ServerData) -> Result<ServerView> {
        let _guard = self.manager.lock_instance(id).await;

        self.repository.get(id).await?;
        if self.manager.is_running(id) {
            tracing::warn!("Refusing to update a running server");
            return Err(Error::ServerRunning("updated".to_string()));
        }

        let server = self.repository.update(id, data).await?;
        Ok(ServerView::new(server, false))
    }

    /// Delete a stopped server
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn remove(&self, id: ServerId) -> Result<()> {
        let guard = self.manager.lock_instance(id).await;

        self.repository.get(id).await?;
        if self.manager.is_running(id) {
            tracing::warn!("Refusing to remove a running server");
            return Err(Error::ServerRunning("removed".to_string()));
        }

        self.repository.remove(id).await?;
        self.manager.forget_instance(guard);
        Ok(())
    }

    /// Start a server from its stored configuration
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn start(&self, id: ServerId) -> Result<ServerView> {
        let guard = self.manager.lock_instance(id).await;

        let server = self.repository.get(id).await?;
        self.manager.start_locked(&guard, &server).await?;

        Ok(self.view(server))
    }

    /// Stop a server
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn stop(&self, id: ServerId) -> Result<ServerView> {
        let guard = self.manager.lock_instance(id).await;

        let server = self.repository.get(id).await?;
        self.manager.stop_locked(&guard, id).await?;

        Ok(self.view(server))
    }

    /// Recent lifecycle events of an existing server, newest first
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(server_id = %id))]
    pub async fn events(&self, id: ServerId, limit: Option<usize>) -> Result<Vec<ServerEvent>> {
        self.repository.get(id).await?;
        Ok(self.manager.events(id, limit))
    }

    /// Recent lifecycle events of every server, newest first; removed servers included
    pub fn all_events(&self, limit: Option<usize>) -> Vec<ServerEvent> {
        self.manager.all_events(limit)
    }

    /// Stop every running server
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down all servers");
        self.manager.stop_all().await
    }
}
