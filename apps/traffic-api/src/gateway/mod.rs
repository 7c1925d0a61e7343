//! Real-time fan-out: sessions, rooms, broadcasts, and the WebSocket endpoint.

pub mod commands;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod hub;
pub mod lifecycle;
pub mod registry;
pub mod rooms;
pub mod scheduler;
pub mod server;
pub mod session;

pub use hub::RealtimeHub;
