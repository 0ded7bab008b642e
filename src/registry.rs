//! Connection registry
//!
//! Process-local map from connection id to the (user, room) pair it joined
//! as. Not durable and not authoritative for membership; it only routes
//! disconnect cleanup and room-scoped broadcasts.

use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct ConnEntry {
    pub user_id: String,
    pub room_id: String,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    entries: DashMap<String, ConnEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Last-writer-wins per connection id; each id belongs to exactly one
    /// physical connection.
    pub fn register(&self, conn_id: &str, user_id: &str, room_id: &str) {
        self.entries.insert(
            conn_id.to_string(),
            ConnEntry {
                user_id: user_id.to_string(),
                room_id: room_id.to_string(),
            },
        );
    }

    pub fn lookup(&self, conn_id: &str) -> Option<ConnEntry> {
        self.entries.get(conn_id).map(|e| e.value().clone())
    }

    pub fn remove(&self, conn_id: &str) -> Option<ConnEntry> {
        self.entries.remove(conn_id).map(|(_, e)| e)
    }

    /// Connection ids currently joined to a room.
    pub fn connections_in_room(&self, room_id: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value().room_id == room_id)
            .map(|e| e.key().clone())
            .collect()
    }

    /// Whether another live connection is joined to the room as the same
    /// user, besides `conn_id`.
    pub fn has_other_connection(&self, conn_id: &str, user_id: &str, room_id: &str) -> bool {
        self.entries.iter().any(|e| {
            e.key() != conn_id && e.value().user_id == user_id && e.value().room_id == room_id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_lookup_remove_roundtrip() {
        let registry = ConnectionRegistry::new();
        registry.register("c1", "u1", "r1");

        let entry = registry.lookup("c1").unwrap();
        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.room_id, "r1");

        let removed = registry.remove("c1").unwrap();
        assert_eq!(removed.user_id, "u1");
        assert!(registry.lookup("c1").is_none());
    }

    #[test]
    fn connections_in_room_filters_by_room() {
        let registry = ConnectionRegistry::new();
        registry.register("c1", "u1", "r1");
        registry.register("c2", "u2", "r1");
        registry.register("c3", "u3", "r2");

        let mut conns = registry.connections_in_room("r1");
        conns.sort();
        assert_eq!(conns, vec!["c1", "c2"]);
    }

    #[test]
    fn detects_other_connections_for_same_user() {
        let registry = ConnectionRegistry::new();
        registry.register("c1", "u1", "r1");
        registry.register("c2", "u1", "r1");

        assert!(registry.has_other_connection("c1", "u1", "r1"));
        registry.remove("c2");
        assert!(!registry.has_other_connection("c1", "u1", "r1"));
    }
}
