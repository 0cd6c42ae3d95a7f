// src/server/supervisor.rs
use crate::config::{ShoutcastSettings, validate_shoutcast_settings};
use crate::error::{Error, Result};
use crate::server::lifecycle::{ServerEvent, ServerLifecycleEvent, ServerLifecycleLog};
use crate::server::locks::{InstanceGuard, InstanceLocks};
use crate::server::registry::{InstanceRegistry, RunningInstance, StopRequest};
use crate::server::{Server, ServerId};
use crate::shoutcast::{ConfigFile, config_path};
use async_process::{Child, Command, Stdio};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Starts, stops and tracks SHOUTcast server processes.
///
/// The manager owns the table of live instances. A server is running from
/// the moment [`start`](Self::start) returns successfully until either
/// [`stop`](Self::stop) succeeds or its process exits on its own.
pub struct ServerManager {
    bin_path: PathBuf,
    configs_dir: PathBuf,
    working_dir: PathBuf,
    registry: Arc<InstanceRegistry>,
    locks: InstanceLocks,
    events: Arc<ServerLifecycleLog>,
}

impl ServerManager {
    /// Create a manager after checking the launch settings.
    ///
    /// Paths are made absolute so that spawned processes resolve their
    /// configuration file regardless of their working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the executable or a directory is missing.
    pub fn new(settings: ShoutcastSettings) -> Result<Self> {
        validate_shoutcast_settings(&settings)?;

        let absolute = |path: &PathBuf| {
            std::fs::canonicalize(path).map_err(|e| {
                Error::ConfigInvalid(format!("Cannot resolve {}: {}", path.display(), e))
            })
        };

        let manager = Self {
            bin_path: absolute(&settings.bin_path)?,
            configs_dir: absolute(&settings.configs_dir)?,
            working_dir: absolute(&settings.working_dir)?,
            registry: Arc::new(InstanceRegistry::new()),
            locks: InstanceLocks::default(),
            events: Arc::new(ServerLifecycleLog::new()),
        };

        tracing::info!(
            bin_path = %manager.bin_path.display(),
            configs_dir = %manager.configs_dir.display(),
            "Created server manager"
        );
        Ok(manager)
    }

    /// Whether a live process is tracked for `id`
    pub fn is_running(&self, id: ServerId) -> bool {
        self.registry.is_running(id)
    }

    /// IDs of every tracked process
    pub fn running_ids(&self) -> Vec<ServerId> {
        self.registry.ids()
    }

    /// Snapshot of the record for a running server
    pub fn instance(&self, id: ServerId) -> Option<RunningInstance> {
        self.registry.get(id)
    }

    /// Where the configuration file for `id` is written
    pub fn config_path(&self, id: ServerId) -> PathBuf {
        config_path(&self.configs_dir, id)
    }

    /// Wait for exclusive hold on one server's lifecycle
    pub async fn lock_instance(&self, id: ServerId) -> InstanceGuard {
        self.locks.acquire(id).await
    }

    /// Release a guard and drop its lock entry; used once a server is deleted
    pub fn forget_instance(&self, guard: InstanceGuard) {
        self.locks.release_and_forget(guard);
    }

    /// Subscribe to lifecycle events recorded from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Recent lifecycle events for a server, newest first
    pub fn events(&self, id: ServerId, limit: Option<usize>) -> Vec<ServerEvent> {
        self.events.server_events(id, limit)
    }

    /// Recent lifecycle events for every server, newest first
    pub fn all_events(&self, limit: Option<usize>) -> Vec<ServerEvent> {
        self.events.all_events(limit)
    }

    /// Start a server process.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyRunning`] if a process is already tracked for this server
    /// * [`Error::Validation`] if a password cannot be written to the configuration file
    /// * [`Error::Io`] if the configuration file cannot be written
    /// * [`Error::Process`] if the executable cannot be spawned
    pub async fn start(&self, server: &Server) -> Result<()> {
        let guard = self.lock_instance(server.id).await;
        self.start_locked(&guard, server).await
    }

    /// [`start`](Self::start) for a caller already holding the server's guard
    #[tracing::instrument(skip(self, guard, server), fields(server_id = %server.id, port_base = server.port_base))]
    pub async fn start_locked(&self, guard: &InstanceGuard, server: &Server) -> Result<()> {
        check_guard(guard, server.id)?;

        if self.registry.is_running(server.id) {
            tracing::warn!("Attempted to start a server that is already running");
            return Err(Error::AlreadyRunning);
        }

        let config_file = self.config_path(server.id);
        let written = match ConfigFile::from_server(server) {
            Ok(file) => file.write_to(&config_file).await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            tracing::error!(error = %e, "Failed to write server configuration");
            e
        })?;

        let mut command = Command::new(&self.bin_path);
        command
            .arg(&config_file)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(error = %e, "Failed to spawn server process");
                self.events.record(
                    ServerEvent::new(server.id, ServerLifecycleEvent::SpawnFailed)
                        .with_details(e.to_string()),
                );
                return Err(Error::Process(format!("Failed to start process: {}", e)));
            }
        };

        let pid = child.id();
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let instance = RunningInstance::new(server.clone(), pid, stop_tx);
        let run_id = instance.run_id();

        if let Err(e) = self.registry.register(instance) {
            // Unreachable while the guard is held, but never leave an untracked child
            if let Err(kill_err) = child.kill() {
                tracing::warn!(pid, error = %kill_err, "Failed to kill untracked server process");
            }
            return Err(e);
        }

        self.events
            .record(ServerEvent::new(server.id, ServerLifecycleEvent::Started).with_pid(pid));
        tracing::info!(pid, "Server started");

        // The watcher owns the child; it is registered only after the record
        // exists so an instant exit cannot leave a stale entry behind.
        tokio::spawn(watch_process(
            child,
            stop_rx,
            server.id,
            run_id,
            Arc::clone(&self.registry),
            Arc::clone(&self.events),
        ));

        Ok(())
    }

    /// Stop a server process.
    ///
    /// Sends `SIGINT` and forgets the process immediately; the server is
    /// reported as not running as soon as this returns, even if the process
    /// takes longer to exit. The signal is sent by the task owning the
    /// child, which skips it once the child has been reaped. A reap landing
    /// between that check and the `kill` call is not covered.
    ///
    /// # Errors
    ///
    /// * [`Error::NotRunning`] if no process is tracked for this server
    /// * [`Error::Process`] if the signal cannot be delivered
    pub async fn stop(&self, server: &Server) -> Result<()> {
        let guard = self.lock_instance(server.id).await;
        self.stop_locked(&guard, server.id).await
    }

    /// [`stop`](Self::stop) for a caller already holding the server's guard
    #[tracing::instrument(skip(self, guard), fields(server_id = %id))]
    pub async fn stop_locked(&self, guard: &InstanceGuard, id: ServerId) -> Result<()> {
        check_guard(guard, id)?;

        let Some(instance) = self.registry.get(id) else {
            tracing::warn!("Attempted to stop a server that is not running");
            return Err(Error::NotRunning);
        };

        let pid = instance.pid();
        instance.interrupt().await.map_err(|e| {
            tracing::error!(pid, error = %e, "Failed to signal server process");
            e
        })?;

        self.registry.unregister(id);
        self.events
            .record(ServerEvent::new(id, ServerLifecycleEvent::Stopped).with_pid(pid));

        tracing::info!(pid, "Server stopped");
        Ok(())
    }

    /// Stop every running server.
    ///
    /// All servers are attempted; failures are aggregated.
    #[tracing::instrument(skip(self))]
    pub async fn stop_all(&self) -> Result<()> {
        let ids = self.registry.ids();
        tracing::info!(count = ids.len(), "Stopping all servers");

        let mut errors = Vec::new();
        for id in ids {
            let guard = self.lock_instance(id).await;
            match self.stop_locked(&guard, id).await {
                // Exited between listing and locking
                Ok(()) | Err(Error::NotRunning) => {}
                Err(e) => {
                    tracing::error!(server_id = %id, error = %e, "Failed to stop server");
                    errors.push((id, e));
                }
            }
        }

        match errors.len() {
            0 => {
                tracing::info!("All servers stopped successfully");
                Ok(())
            }
            1 => Err(errors.remove(0).1),
            _ => {
                let error_msg = errors
                    .iter()
                    .map(|(id, e)| format!("{}: {}", id, e))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Error::Process(format!(
                    "Multiple servers failed to stop: {}",
                    error_msg
                )))
            }
        }
    }
}

/// Own a server process until it exits.
///
/// Interrupt requests are served here, where the child is still unreaped,
/// so a signal can only reach the process this run spawned.
async fn watch_process(
    mut child: Child,
    mut stop_rx: mpsc::Receiver<StopRequest>,
    id: ServerId,
    run_id: Uuid,
    registry: Arc<InstanceRegistry>,
    events: Arc<ServerLifecycleLog>,
) {
    let pid = child.id();
    let mut interrupted = false;

    let status = loop {
        tokio::select! {
            status = child.status() => break status,
            Some(reply) = stop_rx.recv() => {
                let result = match child.try_status() {
                    Ok(Some(_)) => {
                        tracing::debug!(server_id = %id, pid, "Process already exited");
                        Ok(())
                    }
                    _ => signal::interrupt(pid),
                };
                interrupted |= result.is_ok();
                // The stopper may have given up waiting
                let _ = reply.send(result);
            }
        }
    };
    let exit_code = status.as_ref().ok().and_then(|s| s.code());

    // A wait failure also ends tracking: the process can no longer be observed
    let removed = registry.unregister_run(id, run_id).is_some();
    let stopped = interrupted || !removed;

    let details = match (&status, stopped) {
        (Err(e), _) => {
            tracing::error!(server_id = %id, pid, error = %e, "Failed to wait for server process");
            format!("failed to wait for process: {}", e)
        }
        (Ok(_), false) => {
            tracing::warn!(server_id = %id, pid, ?exit_code, "Server process exited");
            "process exited".to_string()
        }
        (Ok(_), true) => {
            tracing::debug!(server_id = %id, pid, ?exit_code, "Stopped server process exited");
            "process exited after stop".to_string()
        }
    };

    events.record(
        ServerEvent::new(id, ServerLifecycleEvent::Exited)
            .with_pid(pid)
            .with_exit_code(exit_code)
            .with_details(details),
    );
}

fn check_guard(guard: &InstanceGuard, id: ServerId) -> Result<()> {
    if guard.id() != id {
        return Err(Error::Other(format!(
            "guard for {} used for server {}",
            guard.id(),
            id
        )));
    }
    Ok(())
}

#[cfg(unix)]
mod signal {
    use crate::error::{Error, Result};
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    /// Send `SIGINT`; a process that is already gone counts as success
    pub(crate) fn interrupt(pid: u32) -> Result<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| Error::Process(format!("Invalid process id {}", pid)))?;

        match kill(Pid::from_raw(raw), Signal::SIGINT) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                tracing::debug!(pid, "Process already gone");
                Ok(())
            }
            Err(e) => Err(Error::Process(format!(
                "Failed to send SIGINT to {}: {}",
                pid, e
            ))),
        }
    }
}

#[cfg(not(unix))]
mod signal {
    use crate::error::{Error, Result};

    pub(crate) fn interrupt(pid: u32) -> Result<()> {
        Err(Error::Process(format!(
            "Cannot interrupt process {}: signals are not supported on this platform",
            pid
        )))
    }
}
