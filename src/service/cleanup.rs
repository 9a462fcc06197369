//! Background session cleanup task.
//!
//! Periodically drops expired sessions from whichever store backs the manager.

use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::sessions::SessionManager;

/// Spawn a background task that periodically purges expired sessions.
///
/// Returns a `JoinHandle` that can be used to abort the task.
pub fn spawn_cleanup_task(
    manager: SessionManager,
    cleanup_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(cleanup_interval);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match manager.purge_expired().await {
                Ok(0) => debug!("Session cleanup: no expired sessions"),
                Ok(count) => info!(evicted = count, "Session cleanup completed"),
                Err(e) => warn!(error = %e, "Session cleanup failed"),
            }

            if let Ok(count) = manager.session_count().await {
                debug!(active_sessions = count, "Session store status");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::sessions::{MemorySessionStore, SessionStore};

    #[tokio::test(start_paused = true)]
    async fn cleanup_task_evicts_expired_sessions() {
        let store = SessionStore::Memory(MemorySessionStore::new());
        let stale = SessionManager::new(store.clone(), Some(chrono::Duration::seconds(-1)));
        let live = SessionManager::new(store, Some(chrono::Duration::hours(1)));
        stale.create().await.expect("create stale");
        live.create().await.expect("create live");

        let handle = spawn_cleanup_task(live.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(live.session_count().await.expect("count"), 1);
        handle.abort();
    }
}
