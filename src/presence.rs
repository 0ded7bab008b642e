//! Presence tracking
//!
//! One durable record per live connection; the global connected-count is
//! derived by counting records rather than kept in memory, so it survives
//! restarts and stays honest across coordinator instances.

use std::sync::Arc;

use crate::store::{now_ms, PresenceStore, StoreError};

pub struct PresenceTracker {
    store: Arc<dyn PresenceStore>,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    /// Record a new connection; returns the updated global count.
    pub async fn on_connect(&self, conn_id: &str) -> Result<u64, StoreError> {
        self.store.insert_connection(conn_id, now_ms()).await?;
        self.store.count_connections().await
    }

    /// Drop the connection's record; returns the updated global count.
    pub async fn on_disconnect(&self, conn_id: &str) -> Result<u64, StoreError> {
        self.store.remove_connection(conn_id).await?;
        self.store.count_connections().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn connect_and_disconnect_adjust_count_by_one() {
        let store = Arc::new(MemoryStore::new());
        let tracker = PresenceTracker::new(store.clone());

        assert_eq!(tracker.on_connect("c1").await.unwrap(), 1);
        assert_eq!(tracker.on_connect("c2").await.unwrap(), 2);
        assert_eq!(tracker.on_disconnect("c1").await.unwrap(), 1);
        assert_eq!(tracker.on_disconnect("c2").await.unwrap(), 0);
    }
}
