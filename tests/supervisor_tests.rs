#![cfg(unix)]

mod common;

use common::{EXITS_IMMEDIATELY, LONG_RUNNING, fake_shoutcast};
use galena::config::ShoutcastSettings;
use galena::error::{Error, Result};
use galena::server::{Server, ServerData, ServerLifecycleEvent, ServerManager};
use galena::shoutcast::ConfigFile;
use galena::store::{MemoryStore, ServerRepository};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn stored_server(port_base: i64) -> Result<Server> {
    let repository = ServerRepository::new(Arc::new(MemoryStore::new()));
    repository
        .create(
            ServerData::new("Rock FM", port_base)
                .with_passwords("listen", "admin")
                .with_max_users(32),
        )
        .await
}

fn manager(script: &str) -> (TempDir, ServerManager) {
    let dir = TempDir::new().unwrap();
    let manager = ServerManager::new(fake_shoutcast(dir.path(), script)).unwrap();
    (dir, manager)
}

#[tokio::test]
async fn test_start_and_stop() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let server = stored_server(8000).await?;

    assert!(!manager.is_running(server.id));

    manager.start(&server).await?;
    assert!(manager.is_running(server.id));
    assert_eq!(manager.running_ids(), vec![server.id]);

    let instance = manager.instance(server.id).expect("instance tracked");
    assert!(instance.pid() > 0);
    assert_eq!(instance.server(), &server);

    manager.stop(&server).await?;
    // Reported as stopped as soon as stop returns
    assert!(!manager.is_running(server.id));
    assert!(manager.instance(server.id).is_none());

    Ok(())
}

#[tokio::test]
async fn test_start_twice_is_a_conflict() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let server = stored_server(8000).await?;

    manager.start(&server).await?;
    let first_pid = manager.instance(server.id).map(|i| i.pid());

    let result = manager.start(&server).await;
    assert!(matches!(result, Err(Error::AlreadyRunning)));
    assert_eq!(manager.instance(server.id).map(|i| i.pid()), first_pid);

    manager.stop_all().await?;
    Ok(())
}

#[tokio::test]
async fn test_stop_when_not_running() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let server = stored_server(8000).await?;

    let result = manager.stop(&server).await;
    assert!(matches!(result, Err(Error::NotRunning)));
    Ok(())
}

#[tokio::test]
async fn test_start_writes_config_file() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let server = stored_server(8010).await?;

    manager.start(&server).await?;

    let path = manager.config_path(server.id);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(format!("{}.config", server.id).as_str())
    );

    let raw = std::fs::read_to_string(&path)?;
    assert!(raw.contains("portbase=8010\r\n"));

    let written = ConfigFile::read_from(&path).await?.to_server_data()?;
    assert_eq!(written.port_base, 8010);
    assert_eq!(written.max_users, 32);
    assert_eq!(written.password, "listen");
    assert_eq!(written.admin_password, "admin");

    manager.stop(&server).await?;
    Ok(())
}

#[tokio::test]
async fn test_process_exit_is_detected() -> Result<()> {
    let (_dir, manager) = manager(EXITS_IMMEDIATELY);
    let server = stored_server(8000).await?;
    let mut events = manager.subscribe();

    manager.start(&server).await?;

    let exited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if event.event == ServerLifecycleEvent::Exited => break event,
                Ok(_) => continue,
                Err(e) => panic!("event channel closed: {}", e),
            }
        }
    })
    .await
    .expect("exit was not observed");

    assert_eq!(exited.server_id, server.id);
    assert_eq!(exited.exit_code, Some(3));
    assert!(!manager.is_running(server.id));

    // A crashed server can be started again
    manager.start(&server).await?;

    let history = manager.events(server.id, None);
    assert!(history.len() >= 3);
    assert_eq!(history.last().map(|e| e.event), Some(ServerLifecycleEvent::Started));
    assert!(history.iter().any(|e| e.event == ServerLifecycleEvent::Exited));
    Ok(())
}

#[tokio::test]
async fn test_stopped_process_is_reaped() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let server = stored_server(8000).await?;
    let mut events = manager.subscribe();

    manager.start(&server).await?;
    manager.stop(&server).await?;

    let exited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if event.event == ServerLifecycleEvent::Exited => break event,
                Ok(_) => continue,
                Err(e) => panic!("event channel closed: {}", e),
            }
        }
    })
    .await
    .expect("interrupted process was not reaped");

    // Killed by SIGINT, so there is no exit code
    assert_eq!(exited.exit_code, None);
    assert_eq!(exited.details.as_deref(), Some("process exited after stop"));
    assert!(!manager.is_running(server.id));

    let all = manager.all_events(None);
    assert!(all.iter().any(|e| e.event == ServerLifecycleEvent::Stopped));
    assert!(all.iter().any(|e| e.event == ServerLifecycleEvent::Exited));
    Ok(())
}

#[tokio::test]
async fn test_start_refuses_unwritable_password() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let mut server = stored_server(8000).await?;
    server.password = "listen\r\nportbase=9000".to_string();

    let result = manager.start(&server).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(!manager.is_running(server.id));
    assert!(!manager.config_path(server.id).exists());
    Ok(())
}

#[tokio::test]
async fn test_stop_all_stops_every_server() -> Result<()> {
    let (_dir, manager) = manager(LONG_RUNNING);
    let first = stored_server(8000).await?;
    let second = stored_server(8002).await?;

    manager.start(&first).await?;
    manager.start(&second).await?;
    assert_eq!(manager.running_ids().len(), 2);

    manager.stop_all().await?;
    assert!(manager.running_ids().is_empty());
    Ok(())
}

#[test]
fn test_missing_executable_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("config")).unwrap();

    let settings = ShoutcastSettings {
        bin_path: dir.path().join("does-not-exist"),
        configs_dir: dir.path().join("config"),
        working_dir: dir.path().to_path_buf(),
    };

    let result = ServerManager::new(settings);
    assert!(matches!(result, Err(Error::ConfigInvalid(_))));
}
