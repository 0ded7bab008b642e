//! Application state

use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::presence::PresenceTracker;
use crate::registry::ConnectionRegistry;
use crate::store::{FileStore, RoomStore};

/// Shared coordinator state, passed explicitly to every handler.
pub struct AppState {
    /// Durable room documents (external collaborator)
    pub rooms: Arc<dyn RoomStore>,
    /// File metadata + blob deletion (external collaborator)
    pub files: Arc<dyn FileStore>,
    /// connection id -> (user, room), process-local
    pub registry: Arc<ConnectionRegistry>,
    /// Live connection records and the derived global count
    pub presence: PresenceTracker,
    /// Fan-out to connected clients
    pub broadcaster: Broadcaster,
    /// Settings
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        rooms: Arc<dyn RoomStore>,
        presence: Arc<dyn crate::store::PresenceStore>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            rooms,
            files,
            broadcaster: Broadcaster::new(registry.clone()),
            presence: PresenceTracker::new(presence),
            registry,
            config: Arc::new(config),
        }
    }
}
