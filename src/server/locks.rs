use crate::server::ServerId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Exclusive hold on one server's lifecycle.
///
/// While a guard exists no other start, stop, update or removal of the
/// same server can proceed. Dropping it releases the hold.
#[derive(Debug)]
pub struct InstanceGuard {
    id: ServerId,
    _guard: OwnedMutexGuard<()>,
}

impl InstanceGuard {
    pub fn id(&self) -> ServerId {
        self.id
    }
}

/// One async mutex per server ID, created on first use
#[derive(Debug, Default)]
pub(crate) struct InstanceLocks {
    locks: Mutex<HashMap<ServerId, KeyLock>>,
}

impl InstanceLocks {
    pub(crate) async fn acquire(&self, id: ServerId) -> InstanceGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };

        InstanceGuard {
            id,
            _guard: lock.lock_owned().await,
        }
    }

    /// Release `guard` and drop the lock entry if nobody is waiting on it
    pub(crate) fn release_and_forget(&self, guard: InstanceGuard) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let id = guard.id;
        drop(guard);

        if locks
            .get(&id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_is_exclusive() {
        let locks = Arc::new(InstanceLocks::default());
        let id = ServerId::new();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(id).await.id() })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(waiter.await.unwrap(), id);
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = InstanceLocks::default();
        let _a = locks.acquire(ServerId::new()).await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(ServerId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn forget_removes_idle_entry() {
        let locks = InstanceLocks::default();
        let id = ServerId::new();
        let guard = locks.acquire(id).await;
        assert_eq!(locks.len(), 1);
        locks.release_and_forget(guard);
        assert_eq!(locks.len(), 0);
    }
}
