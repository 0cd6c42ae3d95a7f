use crate::server::ServerId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

/// Maximum number of events kept in history
pub const EVENT_HISTORY_LIMIT: usize = 1000;

const CHANNEL_CAPACITY: usize = 64;

/// Server lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerLifecycleEvent {
    /// Process spawned and registered
    Started,
    /// Stop signal sent and record removed
    Stopped,
    /// The OS reported the process gone
    Exited,
    /// The executable could not be spawned
    SpawnFailed,
}

/// Server lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    /// Server ID
    pub server_id: ServerId,
    /// Event type
    pub event: ServerLifecycleEvent,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Event details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ServerEvent {
    pub fn new(server_id: ServerId, event: ServerLifecycleEvent) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            server_id,
            event,
            timestamp_ms,
            pid: None,
            exit_code: None,
            details: None,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Bounded history of lifecycle events, with live fan-out.
///
/// Subscribers receive every event recorded after they subscribe; slow
/// subscribers may observe `RecvError::Lagged`.
pub struct ServerLifecycleLog {
    events: Mutex<VecDeque<ServerEvent>>,
    sender: broadcast::Sender<ServerEvent>,
}

impl ServerLifecycleLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            events: Mutex::new(VecDeque::new()),
            sender,
        }
    }

    /// Record an event and notify subscribers
    pub fn record(&self, event: ServerEvent) {
        {
            let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
            events.push_back(event.clone());
            // Limit event history
            while events.len() > EVENT_HISTORY_LIMIT {
                events.pop_front();
            }
        }

        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Recent events for a server, newest first
    pub fn server_events(&self, id: ServerId, limit: Option<usize>) -> Vec<ServerEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events
            .iter()
            .rev()
            .filter(|e| e.server_id == id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// All recent events, newest first
    pub fn all_events(&self, limit: Option<usize>) -> Vec<ServerEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

impl Default for ServerLifecycleLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_newest_first_and_filtered() {
        let log = ServerLifecycleLog::new();
        let a = ServerId::new();
        let b = ServerId::new();

        log.record(ServerEvent::new(a, ServerLifecycleEvent::Started).with_pid(1));
        log.record(ServerEvent::new(b, ServerLifecycleEvent::Started));
        log.record(ServerEvent::new(a, ServerLifecycleEvent::Stopped));

        let events = log.server_events(a, None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, ServerLifecycleEvent::Stopped);
        assert_eq!(events[1].pid, Some(1));

        assert_eq!(log.all_events(Some(1))[0].server_id, a);
    }

    #[test]
    fn history_is_bounded() {
        let log = ServerLifecycleLog::new();
        let id = ServerId::new();
        for _ in 0..(EVENT_HISTORY_LIMIT + 5) {
            log.record(ServerEvent::new(id, ServerLifecycleEvent::Exited));
        }
        assert_eq!(log.all_events(None).len(), EVENT_HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn subscribers_see_new_events() {
        let log = ServerLifecycleLog::new();
        let mut rx = log.subscribe();
        let id = ServerId::new();

        log.record(ServerEvent::new(id, ServerLifecycleEvent::SpawnFailed).with_details("boom"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, ServerLifecycleEvent::SpawnFailed);
        assert_eq!(event.details.as_deref(), Some("boom"));
    }
}
