//! Durable store collaborators
//!
//! The coordinator treats rooms, presence records, and file metadata as
//! external document collections reached through these traits. Updates are
//! field-targeted so concurrent events on the same room never clobber each
//! other's unrelated fields.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room not found")]
    RoomNotFound,

    #[error("room already exists")]
    DuplicateRoom,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Display/interaction mode of the shared document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    Code,
    Text,
}

impl EditorMode {
    pub fn toggled(self) -> Self {
        match self {
            EditorMode::Code => EditorMode::Text,
            EditorMode::Text => EditorMode::Code,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Code => "code",
            EditorMode::Text => "text",
        }
    }
}

/// A single chat entry; insertion order is chat order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub text: String,
}

/// Durable room document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// Shared document body, owned by the external sync engine.
    pub text: String,
    pub messages: Vec<ChatMessage>,
    /// userId -> display name; the authoritative membership set.
    pub users: HashMap<String, String>,
    pub theme: String,
    #[serde(rename = "lastActivity")]
    pub last_activity: u64,
    #[serde(rename = "creatorId")]
    pub creator_id: String,
    #[serde(rename = "isEditable")]
    pub is_editable: bool,
    #[serde(rename = "editorMode")]
    pub editor_mode: EditorMode,
}

impl Room {
    /// A fresh room with the defaults applied at creation.
    pub fn new(room_id: String, creator_id: String, now: u64) -> Self {
        Self {
            room_id,
            text: String::new(),
            messages: Vec::new(),
            users: HashMap::new(),
            theme: "light".to_string(),
            last_activity: now,
            creator_id,
            is_editable: true,
            editor_mode: EditorMode::Code,
        }
    }
}

/// Metadata for a file held by the external blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
    #[serde(rename = "uploadedBy")]
    pub uploaded_by: String,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: u64,
}

/// Room document collection.
///
/// Every mutating operation takes the caller's clock and advances
/// `lastActivity` (monotonically, enforced by the implementation).
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, room_id: &str) -> Result<Option<Room>, StoreError>;

    async fn create(&self, room: Room) -> Result<(), StoreError>;

    /// Insert or overwrite a member; returns the updated membership map.
    async fn put_user(
        &self,
        room_id: &str,
        user_id: &str,
        user_name: &str,
        now: u64,
    ) -> Result<HashMap<String, String>, StoreError>;

    /// Remove a member if present; `Some(users)` when removed, `None` when
    /// the user was not in the room.
    async fn remove_user(
        &self,
        room_id: &str,
        user_id: &str,
        now: u64,
    ) -> Result<Option<HashMap<String, String>>, StoreError>;

    async fn append_message(
        &self,
        room_id: &str,
        message: ChatMessage,
        now: u64,
    ) -> Result<(), StoreError>;

    async fn set_theme(&self, room_id: &str, theme: &str, now: u64) -> Result<(), StoreError>;

    /// Flip editability; returns the new state.
    async fn toggle_editable(&self, room_id: &str, now: u64) -> Result<bool, StoreError>;

    /// Flip the editor mode; returns the new mode.
    async fn toggle_editor_mode(&self, room_id: &str, now: u64) -> Result<EditorMode, StoreError>;

    /// Room ids whose `lastActivity` is strictly older than `cutoff`.
    async fn rooms_inactive_since(&self, cutoff: u64) -> Result<Vec<String>, StoreError>;

    /// Delete the room record; `true` if a record was removed.
    async fn delete(&self, room_id: &str) -> Result<bool, StoreError>;
}

/// Active-connection record collection, one record per live connection.
/// The global connected-count is derived by counting records.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn insert_connection(&self, conn_id: &str, connected_at: u64) -> Result<(), StoreError>;

    async fn remove_connection(&self, conn_id: &str) -> Result<(), StoreError>;

    async fn count_connections(&self) -> Result<u64, StoreError>;
}

/// File metadata collection plus the delete side of the blob collaborator.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn list(&self, room_id: &str) -> Result<Vec<FileRecord>, StoreError>;

    /// Ask the blob store to drop the backing object.
    async fn delete_blob(&self, record: &FileRecord) -> Result<(), StoreError>;

    /// Delete all metadata records for a room; returns the removed count.
    async fn delete_metadata(&self, room_id: &str) -> Result<u64, StoreError>;
}
