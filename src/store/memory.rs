//! In-memory store implementation
//!
//! Stands in for the external document store. Each room mutation happens
//! under the room's map entry, so field-targeted updates are atomic per
//! room and message appends observe arrival order.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

use super::{
    ChatMessage, EditorMode, FileRecord, FileStore, PresenceStore, Room, RoomStore, StoreError,
};

pub struct MemoryStore {
    rooms: DashMap<String, Room>,
    /// conn_id -> connected_at
    connections: DashMap<String, u64>,
    /// room_id -> file records
    files: DashMap<String, Vec<FileRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            connections: DashMap::new(),
            files: DashMap::new(),
        }
    }

    /// Register file metadata, standing in for the upload collaborator.
    pub fn insert_file(&self, record: FileRecord) {
        self.files
            .entry(record.room_id.clone())
            .or_default()
            .push(record);
    }

    fn with_room<T>(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut Room) -> T,
    ) -> Result<T, StoreError> {
        match self.rooms.get_mut(room_id) {
            Some(mut room) => Ok(f(room.value_mut())),
            None => Err(StoreError::RoomNotFound),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn touch(room: &mut Room, now: u64) {
    // lastActivity is monotonically non-decreasing
    room.last_activity = room.last_activity.max(now);
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(room_id).map(|r| r.value().clone()))
    }

    async fn create(&self, room: Room) -> Result<(), StoreError> {
        if self.rooms.contains_key(&room.room_id) {
            return Err(StoreError::DuplicateRoom);
        }
        self.rooms.insert(room.room_id.clone(), room);
        Ok(())
    }

    async fn put_user(
        &self,
        room_id: &str,
        user_id: &str,
        user_name: &str,
        now: u64,
    ) -> Result<HashMap<String, String>, StoreError> {
        self.with_room(room_id, |room| {
            room.users.insert(user_id.to_string(), user_name.to_string());
            touch(room, now);
            room.users.clone()
        })
    }

    async fn remove_user(
        &self,
        room_id: &str,
        user_id: &str,
        now: u64,
    ) -> Result<Option<HashMap<String, String>>, StoreError> {
        self.with_room(room_id, |room| {
            if room.users.remove(user_id).is_some() {
                touch(room, now);
                Some(room.users.clone())
            } else {
                None
            }
        })
    }

    async fn append_message(
        &self,
        room_id: &str,
        message: ChatMessage,
        now: u64,
    ) -> Result<(), StoreError> {
        self.with_room(room_id, |room| {
            room.messages.push(message);
            touch(room, now);
        })
    }

    async fn set_theme(&self, room_id: &str, theme: &str, now: u64) -> Result<(), StoreError> {
        self.with_room(room_id, |room| {
            room.theme = theme.to_string();
            touch(room, now);
        })
    }

    async fn toggle_editable(&self, room_id: &str, now: u64) -> Result<bool, StoreError> {
        self.with_room(room_id, |room| {
            room.is_editable = !room.is_editable;
            touch(room, now);
            room.is_editable
        })
    }

    async fn toggle_editor_mode(&self, room_id: &str, now: u64) -> Result<EditorMode, StoreError> {
        self.with_room(room_id, |room| {
            room.editor_mode = room.editor_mode.toggled();
            touch(room, now);
            room.editor_mode
        })
    }

    async fn rooms_inactive_since(&self, cutoff: u64) -> Result<Vec<String>, StoreError> {
        Ok(self
            .rooms
            .iter()
            .filter(|entry| entry.value().last_activity < cutoff)
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn delete(&self, room_id: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.remove(room_id).is_some())
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn insert_connection(&self, conn_id: &str, connected_at: u64) -> Result<(), StoreError> {
        self.connections.insert(conn_id.to_string(), connected_at);
        Ok(())
    }

    async fn remove_connection(&self, conn_id: &str) -> Result<(), StoreError> {
        self.connections.remove(conn_id);
        Ok(())
    }

    async fn count_connections(&self) -> Result<u64, StoreError> {
        Ok(self.connections.len() as u64)
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list(&self, room_id: &str) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self
            .files
            .get(room_id)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }

    async fn delete_blob(&self, _record: &FileRecord) -> Result<(), StoreError> {
        // No backing blobs in the in-memory stand-in
        Ok(())
    }

    async fn delete_metadata(&self, room_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .files
            .remove(room_id)
            .map(|(_, v)| v.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, creator: &str, now: u64) -> Room {
        Room::new(id.to_string(), creator.to_string(), now)
    }

    #[tokio::test]
    async fn create_rejects_duplicate_room_id() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 100)).await.unwrap();
        assert!(matches!(
            store.create(room("r1", "u2", 200)).await,
            Err(StoreError::DuplicateRoom)
        ));
    }

    #[tokio::test]
    async fn put_user_is_idempotent_per_user_id() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 100)).await.unwrap();

        store.put_user("r1", "u1", "Alice", 110).await.unwrap();
        let users = store.put_user("r1", "u1", "Alice", 120).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.get("u1").map(String::as_str), Some("Alice"));
    }

    #[tokio::test]
    async fn remove_user_reports_absent_user() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 100)).await.unwrap();
        store.put_user("r1", "u1", "Alice", 110).await.unwrap();

        assert!(store.remove_user("r1", "u2", 120).await.unwrap().is_none());
        let users = store.remove_user("r1", "u1", 130).await.unwrap().unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn mutations_keep_last_activity_monotonic() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 1_000)).await.unwrap();

        // A stale clock must not move lastActivity backwards
        store.set_theme("r1", "dark", 500).await.unwrap();
        let r = store.get("r1").await.unwrap().unwrap();
        assert_eq!(r.last_activity, 1_000);

        store.set_theme("r1", "light", 2_000).await.unwrap();
        let r = store.get("r1").await.unwrap().unwrap();
        assert_eq!(r.last_activity, 2_000);
    }

    #[tokio::test]
    async fn toggle_ops_flip_and_report_new_state() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 100)).await.unwrap();

        assert!(!store.toggle_editable("r1", 110).await.unwrap());
        assert!(store.toggle_editable("r1", 120).await.unwrap());

        assert_eq!(
            store.toggle_editor_mode("r1", 130).await.unwrap(),
            EditorMode::Text
        );
        assert_eq!(
            store.toggle_editor_mode("r1", 140).await.unwrap(),
            EditorMode::Code
        );
    }

    #[tokio::test]
    async fn append_message_preserves_order() {
        let store = MemoryStore::new();
        store.create(room("r1", "u1", 100)).await.unwrap();

        for i in 0..5 {
            store
                .append_message(
                    "r1",
                    ChatMessage {
                        user_name: "Alice".to_string(),
                        text: format!("msg {i}"),
                    },
                    100 + i,
                )
                .await
                .unwrap();
        }

        let r = store.get("r1").await.unwrap().unwrap();
        let texts: Vec<_> = r.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn inactive_selection_uses_strict_cutoff() {
        let store = MemoryStore::new();
        store.create(room("old", "u1", 1_000)).await.unwrap();
        store.create(room("fresh", "u2", 5_000)).await.unwrap();

        let mut inactive = store.rooms_inactive_since(5_000).await.unwrap();
        inactive.sort();
        assert_eq!(inactive, vec!["old"]);

        // Exactly at the cutoff is not inactive
        let at_cutoff = store.rooms_inactive_since(1_000).await.unwrap();
        assert!(at_cutoff.is_empty());
    }

    #[tokio::test]
    async fn presence_count_tracks_records() {
        let store = MemoryStore::new();
        store.insert_connection("c1", 100).await.unwrap();
        store.insert_connection("c2", 110).await.unwrap();
        assert_eq!(store.count_connections().await.unwrap(), 2);

        store.remove_connection("c1").await.unwrap();
        assert_eq!(store.count_connections().await.unwrap(), 1);

        // Removing an unknown record is a no-op
        store.remove_connection("c9").await.unwrap();
        assert_eq!(store.count_connections().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn file_metadata_listed_and_deleted_per_room() {
        let store = MemoryStore::new();
        store.insert_file(FileRecord {
            file_id: "f1".to_string(),
            room_id: "r1".to_string(),
            file_name: "notes.txt".to_string(),
            file_url: "http://localhost:4000/uploads/notes.txt".to_string(),
            uploaded_by: "Alice".to_string(),
            uploaded_at: 100,
        });
        store.insert_file(FileRecord {
            file_id: "f2".to_string(),
            room_id: "r2".to_string(),
            file_name: "other.txt".to_string(),
            file_url: "http://localhost:4000/uploads/other.txt".to_string(),
            uploaded_by: "Bob".to_string(),
            uploaded_at: 110,
        });

        assert_eq!(store.list("r1").await.unwrap().len(), 1);
        assert_eq!(store.delete_metadata("r1").await.unwrap(), 1);
        assert!(store.list("r1").await.unwrap().is_empty());
        assert_eq!(store.list("r2").await.unwrap().len(), 1);
    }
}
