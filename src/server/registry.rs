use crate::error::{Error, Result};
use crate::server::{Server, ServerId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Ask the task owning a process to interrupt it, and learn the outcome
pub(crate) type StopRequest = oneshot::Sender<Result<()>>;

/// A server process known to be alive.
///
/// This is a snapshot; the child handle itself stays with the task that
/// waits for the process to exit. Signals go through that task.
#[derive(Debug, Clone)]
pub struct RunningInstance {
    server: Server,
    pid: u32,
    run_id: Uuid,
    stop_tx: mpsc::Sender<StopRequest>,
}

impl RunningInstance {
    pub(crate) fn new(server: Server, pid: u32, stop_tx: mpsc::Sender<StopRequest>) -> Self {
        Self {
            server,
            pid,
            run_id: Uuid::new_v4(),
            stop_tx,
        }
    }

    /// Configuration the process was started with
    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Token distinguishing this run from later runs of the same server
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Have the owning task send `SIGINT`.
    ///
    /// A process whose task has already finished counts as interrupted.
    pub(crate) async fn interrupt(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.stop_tx.send(reply_tx).await.is_err() {
            return Ok(());
        }
        reply_rx.await.unwrap_or(Ok(()))
    }
}

/// Table of live server processes, at most one per server ID.
///
/// Reads never wait on process I/O: the table lock is only held for map
/// operations.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: Mutex<HashMap<ServerId, RunningInstance>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ServerId, RunningInstance>> {
        // Every critical section is a single map operation, so a poisoned
        // table is still consistent.
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self, id: ServerId) -> bool {
        self.table().contains_key(&id)
    }

    pub fn get(&self, id: ServerId) -> Option<RunningInstance> {
        self.table().get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<ServerId> {
        self.table().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Add a record; refuses a second record for the same server
    pub(crate) fn register(&self, instance: RunningInstance) -> Result<()> {
        let mut table = self.table();
        let id = instance.server.id;
        if table.contains_key(&id) {
            return Err(Error::AlreadyRunning);
        }
        table.insert(id, instance);
        Ok(())
    }

    /// Remove the record for a server, whatever run it belongs to
    pub(crate) fn unregister(&self, id: ServerId) -> Option<RunningInstance> {
        self.table().remove(&id)
    }

    /// Remove the record only if it still belongs to run `run_id`.
    ///
    /// Returns `None` when the record is gone or was replaced by a newer
    /// run, which makes late exit notifications harmless.
    pub(crate) fn unregister_run(&self, id: ServerId, run_id: Uuid) -> Option<RunningInstance> {
        let mut table = self.table();
        match table.get(&id) {
            Some(instance) if instance.run_id == run_id => table.remove(&id),
            _ => None,
        }
    }
}
