//! Broadcast fan-out
//!
//! Best-effort, at-most-once delivery to currently connected recipients.
//! Room scoping resolves through the connection registry; there is no
//! persistence or replay for late joiners.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::ServerMessage;
use crate::registry::ConnectionRegistry;
use dashmap::DashMap;

pub struct Broadcaster {
    senders: DashMap<String, UnboundedSender<ServerMessage>>,
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            senders: DashMap::new(),
            registry,
        }
    }

    pub fn attach(&self, conn_id: &str, sender: UnboundedSender<ServerMessage>) {
        self.senders.insert(conn_id.to_string(), sender);
    }

    pub fn detach(&self, conn_id: &str) {
        self.senders.remove(conn_id);
    }

    pub fn send_to(&self, conn_id: &str, message: ServerMessage) {
        if let Some(sender) = self.senders.get(conn_id) {
            let _ = sender.send(message);
        }
    }

    /// Deliver to every connection joined to the room.
    pub fn emit_to_room(&self, room_id: &str, message: ServerMessage) {
        for conn_id in self.registry.connections_in_room(room_id) {
            self.send_to(&conn_id, message.clone());
        }
    }

    /// Deliver to the room's connections, excluding the sender.
    pub fn emit_to_room_except(&self, room_id: &str, except: &str, message: ServerMessage) {
        for conn_id in self.registry.connections_in_room(room_id) {
            if conn_id != except {
                self.send_to(&conn_id, message.clone());
            }
        }
    }

    /// Deliver to every live connection, joined or not.
    pub fn emit_global(&self, message: ServerMessage) {
        for entry in self.senders.iter() {
            let _ = entry.value().send(message.clone());
        }
    }
}
