//! Client-server message protocol definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::{ChatMessage, FileRecord};

/// Client -> server session events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userName")]
        user_name: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "isCreator")]
        is_creator: bool,
    },
    ToggleEditability {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    ToggleEditorMode {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    SendMessage {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        message: String,
    },
    TypingStart {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName")]
        user_name: String,
    },
    TypingStop {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    ChangeTheme {
        #[serde(rename = "roomId")]
        room_id: String,
        theme: String,
    },
}

/// Server -> client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    // Connection
    Connected {
        #[serde(rename = "socketId")]
        socket_id: String,
    },
    Error {
        code: String,
        message: String,
    },

    // Request acks
    RoomJoined {
        messages: Vec<ChatMessage>,
        theme: String,
        files: Vec<FileRecord>,
        users: HashMap<String, String>,
        #[serde(rename = "isCreator")]
        is_creator: bool,
        #[serde(rename = "isEditable")]
        is_editable: bool,
        #[serde(rename = "editorMode")]
        editor_mode: String,
    },
    ToggleAck {
        #[serde(rename = "isEditable", skip_serializing_if = "Option::is_none")]
        is_editable: Option<bool>,
        #[serde(rename = "editorMode", skip_serializing_if = "Option::is_none")]
        editor_mode: Option<String>,
    },

    // Room-scoped broadcasts
    RoomUsers {
        #[serde(rename = "roomId")]
        room_id: String,
        users: HashMap<String, String>,
    },
    EditableStateChanged {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "isEditable")]
        is_editable: bool,
    },
    EditorModeChanged {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "editorMode")]
        editor_mode: String,
    },
    ReceiveMessage {
        #[serde(rename = "userName")]
        user_name: String,
        text: String,
    },
    UserTyping {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName")]
        user_name: String,
    },
    UserStoppedTyping {
        #[serde(rename = "userId")]
        user_id: String,
    },
    ThemeChanged(String),
    RoomDeleted {
        message: String,
    },
    NewFile(FileRecord),

    // Global broadcasts
    StatusUpdate {
        #[serde(rename = "totalConnectedUsers")]
        total_connected_users: u64,
    },
}
