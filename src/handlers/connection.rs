//! Connection lifecycle handlers

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::{now_ms, StoreError};

/// Register a new connection, record presence, and announce the new
/// global connected-count.
pub async fn handle_connection(
    state: Arc<AppState>,
    sender: UnboundedSender<ServerMessage>,
) -> String {
    let conn_id = Uuid::new_v4().to_string();

    state.broadcaster.attach(&conn_id, sender.clone());

    match state.presence.on_connect(&conn_id).await {
        Ok(count) => state.broadcaster.emit_global(ServerMessage::StatusUpdate {
            total_connected_users: count,
        }),
        Err(e) => tracing::warn!(conn_id = %conn_id, error = %e, "Failed to record presence"),
    }

    let _ = sender.send(ServerMessage::Connected {
        socket_id: conn_id.clone(),
    });

    tracing::info!(conn_id = %conn_id, "New connection established");
    conn_id
}

/// Tear down a connection: release room membership (unless another live
/// connection keeps the user joined), drop the presence record, and
/// announce the new global count.
pub async fn handle_disconnect(state: Arc<AppState>, conn_id: &str) {
    if let Some(entry) = state.registry.remove(conn_id) {
        if state
            .registry
            .has_other_connection(conn_id, &entry.user_id, &entry.room_id)
        {
            tracing::debug!(
                conn_id = %conn_id,
                user_id = %entry.user_id,
                room_id = %entry.room_id,
                "User still joined through another connection"
            );
        } else {
            match state
                .rooms
                .remove_user(&entry.room_id, &entry.user_id, now_ms())
                .await
            {
                Ok(Some(users)) => {
                    state.broadcaster.emit_to_room(
                        &entry.room_id,
                        ServerMessage::RoomUsers {
                            room_id: entry.room_id.clone(),
                            users,
                        },
                    );
                }
                Ok(None) => {}
                // The room may have been reaped while the user was connected
                Err(StoreError::RoomNotFound) => {}
                Err(e) => tracing::warn!(
                    conn_id = %conn_id,
                    room_id = %entry.room_id,
                    error = %e,
                    "Failed to remove user on disconnect"
                ),
            }
        }
    }

    match state.presence.on_disconnect(conn_id).await {
        Ok(count) => state.broadcaster.emit_global(ServerMessage::StatusUpdate {
            total_connected_users: count,
        }),
        Err(e) => tracing::warn!(conn_id = %conn_id, error = %e, "Failed to drop presence record"),
    }

    state.broadcaster.detach(conn_id);
    tracing::info!(conn_id = %conn_id, "Connection closed");
}
