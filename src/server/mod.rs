/// Server management module for Galena.
///
/// This module holds the server configuration model, its validation, and
/// the supervision of the SHOUTcast processes started from it.
/// All public async operations are instrumented with `tracing` spans.
///
/// # Components
///
/// * `model` - Server identity, attributes and views
/// * `validation` - Field rules for submitted server data
/// * `registry` - Table of live server processes
/// * `lifecycle` - Lifecycle events and their history
/// * `supervisor` - Starting, stopping and reaping server processes
///
/// # Examples
///
/// Starting and stopping a server process:
///
/// ```no_run
/// use galena::config::ShoutcastSettings;
/// use galena::server::{ServerData, ServerManager};
/// use galena::store::{MemoryStore, ServerRepository};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> galena::Result<()> {
/// let repository = ServerRepository::new(Arc::new(MemoryStore::new()));
/// let server = repository
///     .create(
///         ServerData::new("Rock FM", 8000)
///             .with_passwords("listen", "admin")
///             .with_max_users(64),
///     )
///     .await?;
///
/// let manager = ServerManager::new(ShoutcastSettings::default())?;
/// manager.start(&server).await?;
/// assert!(manager.is_running(server.id));
///
/// manager.stop(&server).await?;
/// assert!(!manager.is_running(server.id));
/// # Ok(())
/// # }
/// ```
pub mod lifecycle;
mod locks;
pub mod model;
pub mod registry;
pub mod supervisor;
pub mod validation;

pub use lifecycle::{ServerEvent, ServerLifecycleEvent, ServerLifecycleLog};
pub use locks::InstanceGuard;
pub use model::{Server, ServerData, ServerId, ServerView, Visibility};
pub use registry::{InstanceRegistry, RunningInstance};
pub use supervisor::ServerManager;
pub use validation::validate;
