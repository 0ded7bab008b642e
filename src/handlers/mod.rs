//! Session event handlers

pub mod chat;
pub mod connection;
pub mod reaper;
pub mod room;

pub use chat::*;
pub use connection::*;
pub use reaper::*;
pub use room::*;
