//! WebSocket infrastructure for streaming job events to browsers.
//!
//! Provides connection management, heartbeat pings, the HTTP upgrade
//! handler, and the forwarder that relays bus events to every client.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::EventForwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
