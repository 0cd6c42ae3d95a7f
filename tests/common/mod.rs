#![allow(dead_code)]

use galena::Galena;
use galena::config::ShoutcastSettings;
use galena::server::ServerManager;
use galena::store::{MemoryStore, ServerRepository};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Stand-in for `sc_serv` that keeps running until interrupted
pub const LONG_RUNNING: &str = "#!/bin/sh\nexec sleep 30\n";

/// Stand-in for `sc_serv` that dies straight away
pub const EXITS_IMMEDIATELY: &str = "#!/bin/sh\nexit 3\n";

/// Write an executable script and a configs directory under `dir`
pub fn fake_shoutcast(dir: &Path, script: &str) -> ShoutcastSettings {
    use std::os::unix::fs::PermissionsExt;

    let bin_path = dir.join("sc_serv");
    std::fs::write(&bin_path, script).unwrap();
    std::fs::set_permissions(&bin_path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let configs_dir = dir.join("config");
    std::fs::create_dir_all(&configs_dir).unwrap();

    ShoutcastSettings {
        bin_path,
        configs_dir,
        working_dir: dir.to_path_buf(),
    }
}

/// Coordinator over a memory store and a fake executable
pub fn galena(script: &str) -> (TempDir, Galena) {
    let dir = TempDir::new().unwrap();
    let manager = ServerManager::new(fake_shoutcast(dir.path(), script)).unwrap();
    let repository = ServerRepository::new(Arc::new(MemoryStore::new()));
    (dir, Galena::new(Arc::new(repository), Arc::new(manager)))
}
