//! Inactive-room reclamation
//!
//! Periodic sweep deleting rooms whose lastActivity fell behind the
//! configured threshold, together with their file metadata and blobs.
//! Permanent deletion, no recovery window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::{now_ms, StoreError};

pub struct InactivityReaper {
    state: Arc<AppState>,
    in_flight: AtomicBool,
}

impl InactivityReaper {
    pub fn new(state: Arc<AppState>) -> Arc<Self> {
        Arc::new(Self {
            state,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Run the sweep on the configured cadence until the process exits.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval_secs = self.state.config.reap.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }

    /// Single-flight sweep entry point: a tick that fires while the
    /// previous sweep is still running is skipped.
    pub async fn run_once(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::warn!("Previous sweep still in progress, skipping tick");
            return;
        }
        self.sweep().await;
        self.in_flight.store(false, Ordering::SeqCst);
    }

    async fn sweep(&self) {
        let cutoff = now_ms().saturating_sub(self.state.config.reap.threshold_ms());

        let inactive = match self.state.rooms.rooms_inactive_since(cutoff).await {
            Ok(rooms) => rooms,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query inactive rooms");
                return;
            }
        };

        if inactive.is_empty() {
            tracing::debug!("No inactive rooms found");
            return;
        }

        tracing::info!(count = inactive.len(), "Deleting inactive rooms");

        let mut deleted = 0;
        for room_id in &inactive {
            // One room's failure must not abort the rest of the sweep
            match self.reap_room(room_id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::error!(room_id = %room_id, error = %e, "Failed to reap room")
                }
            }
        }

        tracing::info!(deleted, total = inactive.len(), "Sweep completed");
    }

    async fn reap_room(&self, room_id: &str) -> Result<(), StoreError> {
        let files = self.state.files.list(room_id).await?;

        for file in &files {
            // Blob deletion failures are logged but never block reclamation
            if let Err(e) = self.state.files.delete_blob(file).await {
                tracing::warn!(
                    room_id = %room_id,
                    file_name = %file.file_name,
                    error = %e,
                    "Failed to delete file blob"
                );
            }
        }

        let removed_files = self.state.files.delete_metadata(room_id).await?;
        tracing::info!(room_id = %room_id, removed_files, "Deleted file metadata");

        if !self.state.rooms.delete(room_id).await? {
            tracing::warn!(room_id = %room_id, "Room record was already gone");
        }

        // Opportunistic: reaches only members still connected, if any
        self.state.broadcaster.emit_to_room(
            room_id,
            ServerMessage::RoomDeleted {
                message: "This room has been deleted due to inactivity.".to_string(),
            },
        );

        tracing::info!(room_id = %room_id, "Room reclaimed");
        Ok(())
    }
}
