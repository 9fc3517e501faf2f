//! Domain layer for wsmux-server.
//!
//! Pure types with no dependencies on sockets, polling, or external
//! frameworks, so they are trivially testable and reusable in embedding
//! scenarios.

pub mod config;

pub use config::ServerConfig;
