//! Room state handlers: join, creator toggles, theme, file relay

use crate::error::SessionError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::{now_ms, FileRecord, Room, StoreError};

/// Join a room, creating it lazily when the caller asserts creator status.
///
/// On success the returned ack carries the full room snapshot for the new
/// member; the updated membership map is broadcast to the room.
pub async fn handle_join_room(
    state: &AppState,
    conn_id: &str,
    room_id: &str,
    user_name: &str,
    user_id: &str,
    is_creator: bool,
) -> Result<ServerMessage, SessionError> {
    let now = now_ms();

    let room = match state.rooms.get(room_id).await? {
        Some(room) => room,
        None if is_creator => {
            let room = Room::new(room_id.to_string(), user_id.to_string(), now);
            match state.rooms.create(room.clone()).await {
                Ok(()) => {
                    tracing::info!(room_id = %room_id, user_name = %user_name, "Room created");
                    room
                }
                // Lost a creation race; the other creator's room wins
                Err(StoreError::DuplicateRoom) => state
                    .rooms
                    .get(room_id)
                    .await?
                    .ok_or(SessionError::RoomNotFound)?,
                Err(e) => return Err(e.into()),
            }
        }
        None => return Err(SessionError::RoomNotFound),
    };

    // Idempotent re-join: same userId overwrites its own entry
    let users = state.rooms.put_user(room_id, user_id, user_name, now).await?;

    state.registry.register(conn_id, user_id, room_id);

    let files = match state.files.list(room_id).await {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to list room files");
            Vec::new()
        }
    };

    state.broadcaster.emit_to_room(
        room_id,
        ServerMessage::RoomUsers {
            room_id: room_id.to_string(),
            users: users.clone(),
        },
    );

    tracing::info!(
        user_name = %user_name,
        user_id = %user_id,
        room_id = %room_id,
        "User joined room"
    );

    Ok(ServerMessage::RoomJoined {
        messages: room.messages,
        theme: room.theme,
        files,
        users,
        is_creator: room.creator_id == user_id,
        is_editable: room.is_editable,
        editor_mode: room.editor_mode.as_str().to_string(),
    })
}

/// Flip whether the shared document accepts edits. Creator only.
pub async fn handle_toggle_editability(
    state: &AppState,
    room_id: &str,
    user_id: &str,
) -> Result<ServerMessage, SessionError> {
    let room = state
        .rooms
        .get(room_id)
        .await?
        .ok_or(SessionError::RoomNotFound)?;

    if room.creator_id != user_id {
        return Err(SessionError::PermissionDenied);
    }

    let is_editable = state.rooms.toggle_editable(room_id, now_ms()).await?;

    state.broadcaster.emit_to_room(
        room_id,
        ServerMessage::EditableStateChanged {
            room_id: room_id.to_string(),
            is_editable,
        },
    );

    tracing::info!(room_id = %room_id, is_editable, "Editability toggled");

    Ok(ServerMessage::ToggleAck {
        is_editable: Some(is_editable),
        editor_mode: None,
    })
}

/// Flip the editor between code and text mode. Creator only.
pub async fn handle_toggle_editor_mode(
    state: &AppState,
    room_id: &str,
    user_id: &str,
) -> Result<ServerMessage, SessionError> {
    let room = state
        .rooms
        .get(room_id)
        .await?
        .ok_or(SessionError::RoomNotFound)?;

    if room.creator_id != user_id {
        return Err(SessionError::PermissionDenied);
    }

    let editor_mode = state.rooms.toggle_editor_mode(room_id, now_ms()).await?;

    state.broadcaster.emit_to_room(
        room_id,
        ServerMessage::EditorModeChanged {
            room_id: room_id.to_string(),
            editor_mode: editor_mode.as_str().to_string(),
        },
    );

    tracing::info!(room_id = %room_id, editor_mode = %editor_mode.as_str(), "Editor mode toggled");

    Ok(ServerMessage::ToggleAck {
        is_editable: None,
        editor_mode: Some(editor_mode.as_str().to_string()),
    })
}

/// Persist a theme change and notify the room. Fire-and-forget; failures
/// are logged for operators and never reach the client. Unknown rooms are
/// dropped rather than upserted.
pub async fn handle_change_theme(state: &AppState, room_id: &str, theme: &str) {
    match state.rooms.set_theme(room_id, theme, now_ms()).await {
        Ok(()) => {
            state
                .broadcaster
                .emit_to_room(room_id, ServerMessage::ThemeChanged(theme.to_string()));
        }
        Err(StoreError::RoomNotFound) => {
            tracing::warn!(room_id = %room_id, "Theme change for unknown room dropped");
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to persist theme change");
        }
    }
}

/// Relay a freshly stored file record to the room. Called on behalf of the
/// upload collaborator once it has persisted the metadata.
pub fn notify_file_added(state: &AppState, record: FileRecord) {
    let room_id = record.room_id.clone();
    state
        .broadcaster
        .emit_to_room(&room_id, ServerMessage::NewFile(record));
    tracing::info!(room_id = %room_id, "Relayed new file to room");
}
