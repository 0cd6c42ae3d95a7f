#![cfg(unix)]

mod common;

use common::{LONG_RUNNING, galena};
use galena::error::{Error, ErrorKind, Result};
use galena::server::{ServerData, ServerId, ServerLifecycleEvent};

fn rock_fm(port_base: i64) -> ServerData {
    ServerData::new("Rock FM", port_base)
        .with_passwords("listen", "admin")
        .with_max_users(64)
}

#[tokio::test]
async fn test_created_server_is_not_running() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);

    let view = galena.create(rock_fm(8000)).await?;
    assert!(!view.is_running);
    assert_eq!(galena.get(view.id()).await?, view);

    let listed = galena.list().await?;
    assert_eq!(listed, vec![view]);
    Ok(())
}

#[tokio::test]
async fn test_start_reports_running_view() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);
    let id = galena.create(rock_fm(8000)).await?.id();

    let view = galena.start(id).await?;
    assert!(view.is_running);
    assert!(galena.get(id).await?.is_running);

    let view = galena.stop(id).await?;
    assert!(!view.is_running);

    let events = galena.events(id, None).await?;
    assert!(events.iter().any(|e| e.event == ServerLifecycleEvent::Stopped));
    assert_eq!(events.last().map(|e| e.event), Some(ServerLifecycleEvent::Started));
    Ok(())
}

#[tokio::test]
async fn test_running_server_cannot_be_removed() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);
    let id = galena.create(rock_fm(8000)).await?.id();
    galena.start(id).await?;

    let err = galena.remove(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Server running. Cannot be removed");

    // Still stored and still running
    assert!(galena.get(id).await?.is_running);

    galena.stop(id).await?;
    galena.remove(id).await?;
    assert!(matches!(galena.get(id).await, Err(Error::ServerNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_running_server_cannot_be_updated() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);
    let original = galena.create(rock_fm(8000)).await?;
    galena.start(original.id()).await?;

    let err = galena
        .update(original.id(), rock_fm(8000).with_max_users(10))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server running. Cannot be updated");
    assert_eq!(galena.get(original.id()).await?.server.max_users, 64);

    galena.stop(original.id()).await?;
    let updated = galena
        .update(original.id(), rock_fm(8000).with_max_users(10))
        .await?;
    assert_eq!(updated.server.max_users, 10);
    Ok(())
}

#[tokio::test]
async fn test_unknown_server_is_not_found() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);
    let id: ServerId = "6f1c9d3e-7b0a-4c55-9a57-0c3f7bd1e2a4".parse()?;

    for err in [
        galena.get(id).await.unwrap_err(),
        galena.start(id).await.unwrap_err(),
        galena.stop(id).await.unwrap_err(),
        galena.remove(id).await.unwrap_err(),
        galena.update(id, rock_fm(8000)).await.unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    Ok(())
}

#[tokio::test]
async fn test_concurrent_starts_spawn_one_process() -> Result<()> {
    let (_dir, galena) = galena(LONG_RUNNING);
    let id = galena.create(rock_fm(8000)).await?.id();

    let (a, b) = tokio::join!(galena.start(id), galena.start(id));
    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(galena.manager().running_ids(), vec![id]);

    galena.shutdown().await?;
    assert!(!galena.get(id).await?.is_running);
    Ok(())
}
