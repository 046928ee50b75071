use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

/// Identifies one playback session's registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One-time "engine capability available" notifications, keyed by session.
#[derive(Default)]
pub struct ReadyRegistry {
    available: AtomicBool,
    waiters: Mutex<HashMap<SessionHandle, oneshot::Sender<()>>>,
}

impl ReadyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Registers `handle`, replacing any earlier registration for it. The
    /// receiver resolves at once when the capability is already available.
    pub async fn register(&self, handle: SessionHandle) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock().await;
        if self.is_available() {
            let _ = tx.send(());
        } else {
            waiters.insert(handle, tx);
        }
        rx
    }

    pub async fn deregister(&self, handle: SessionHandle) {
        self.waiters.lock().await.remove(&handle);
    }

    #[cfg(test)]
    async fn is_registered(&self, handle: SessionHandle) -> bool {
        self.waiters.lock().await.contains_key(&handle)
    }

    /// Fires every pending registration once.
    pub async fn mark_available(&self) {
        let mut waiters = self.waiters.lock().await;
        self.available.store(true, Ordering::Release);
        for (handle, tx) in waiters.drain() {
            if tx.send(()).is_err() {
                tracing::debug!(%handle, "ready waiter already gone");
            }
        }
    }
}
