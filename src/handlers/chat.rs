//! Chat and typing-indicator handlers
//!
//! All fire-and-forget: failures are logged, never surfaced to the caller.

use crate::error::SessionError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::{now_ms, ChatMessage};

/// Append a chat message and broadcast it to the room. Messages from a
/// userId not present in the room's membership are dropped.
pub async fn handle_send_message(state: &AppState, room_id: &str, user_id: &str, message: &str) {
    let room = match state.rooms.get(room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => {
            tracing::warn!(room_id = %room_id, "Message for unknown room dropped");
            return;
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, error = %e, "Failed to load room for message");
            return;
        }
    };

    let Some(user_name) = room.users.get(user_id) else {
        tracing::warn!(
            room_id = %room_id,
            user_id = %user_id,
            error = %SessionError::InvalidUser,
            "Message from non-member dropped"
        );
        return;
    };

    let full_message = ChatMessage {
        user_name: user_name.clone(),
        text: message.to_string(),
    };

    if let Err(e) = state
        .rooms
        .append_message(room_id, full_message.clone(), now_ms())
        .await
    {
        tracing::warn!(room_id = %room_id, error = %e, "Failed to persist message");
        return;
    }

    state.broadcaster.emit_to_room(
        room_id,
        ServerMessage::ReceiveMessage {
            user_name: full_message.user_name,
            text: full_message.text,
        },
    );
}

/// Relay a typing indicator to everyone else in the room. No persistence.
pub fn handle_typing_start(
    state: &AppState,
    conn_id: &str,
    room_id: &str,
    user_id: &str,
    user_name: &str,
) {
    state.broadcaster.emit_to_room_except(
        room_id,
        conn_id,
        ServerMessage::UserTyping {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
        },
    );
}

pub fn handle_typing_stop(state: &AppState, conn_id: &str, room_id: &str, user_id: &str) {
    state.broadcaster.emit_to_room_except(
        room_id,
        conn_id,
        ServerMessage::UserStoppedTyping {
            user_id: user_id.to_string(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::room::handle_join_room;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        Arc::new(AppState::new(
            Config::from_env(),
            store.clone(),
            store.clone(),
            store,
        ))
    }

    fn connect(state: &AppState, conn_id: &str) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        state.broadcaster.attach(conn_id, tx);
        rx
    }

    async fn seed_room(state: &AppState) -> (UnboundedReceiver<ServerMessage>, UnboundedReceiver<ServerMessage>) {
        let mut rx1 = connect(state, "c1");
        let mut rx2 = connect(state, "c2");
        handle_join_room(state, "c1", "r1", "Alice", "u1", true)
            .await
            .unwrap();
        handle_join_room(state, "c2", "r1", "Bob", "u2", false)
            .await
            .unwrap();
        while rx1.try_recv().is_ok() {}
        while rx2.try_recv().is_ok() {}
        (rx1, rx2)
    }

    #[tokio::test]
    async fn member_message_persists_and_broadcasts_display_name() {
        let state = test_state();
        let (mut rx1, mut rx2) = seed_room(&state).await;

        handle_send_message(&state, "r1", "u2", "hi").await;

        let room = state.rooms.get("r1").await.unwrap().unwrap();
        assert_eq!(room.messages.len(), 1);
        assert_eq!(room.messages[0].user_name, "Bob");
        assert_eq!(room.messages[0].text, "hi");

        for rx in [&mut rx1, &mut rx2] {
            match rx.try_recv() {
                Ok(ServerMessage::ReceiveMessage { user_name, text }) => {
                    assert_eq!(user_name, "Bob");
                    assert_eq!(text, "hi");
                }
                other => panic!("expected receive_message, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn non_member_message_is_dropped_silently() {
        let state = test_state();
        let (mut rx1, _rx2) = seed_room(&state).await;

        handle_send_message(&state, "r1", "u99", "spoofed").await;

        let room = state.rooms.get("r1").await.unwrap().unwrap();
        assert!(room.messages.is_empty());
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn message_for_unknown_room_is_dropped() {
        let state = test_state();
        handle_send_message(&state, "ghost", "u1", "hello?").await;
        assert!(state.rooms.get("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn typing_indicators_exclude_the_sender() {
        let state = test_state();
        let (mut rx1, mut rx2) = seed_room(&state).await;

        handle_typing_start(&state, "c2", "r1", "u2", "Bob");
        assert!(matches!(rx1.try_recv(), Ok(ServerMessage::UserTyping { .. })));
        assert!(rx2.try_recv().is_err());

        handle_typing_stop(&state, "c2", "r1", "u2");
        assert!(matches!(
            rx1.try_recv(),
            Ok(ServerMessage::UserStoppedTyping { .. })
        ));
        assert!(rx2.try_recv().is_err());
    }
}
