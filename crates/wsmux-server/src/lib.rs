//! wsmux-server library crate.
//!
//! A minimal WebSocket server: it accepts raw TCP connections, upgrades
//! qualifying ones via the RFC 6455 opening handshake, then exchanges data
//! frames with each client from a single-threaded readiness-multiplexing
//! loop.
//!
//! # Architecture
//!
//! ```text
//! WebSocket client
//!         ↕
//! [wsmux-server]
//!   ├── domain/           Pure types: ServerConfig
//!   ├── application/      The Service callback contract + EchoService
//!   └── infrastructure/
//!         ├── connection/ One socket: handshake state, send/receive
//!         └── reactor/    mio Poll loop, accept/dispatch/disconnect
//!         ↕
//! wsmux-core  (handshake + frame codecs, pure bytes)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no frameworks).
//! - `application` depends on `infrastructure::connection` only through the
//!   narrow send surface its callbacks receive.
//! - `infrastructure` depends on all other layers plus `mio` and
//!   `wsmux-core`.
//!
//! # Concurrency model
//!
//! One thread, one loop. The only suspension point is the blocking
//! readiness wait; every accept, read, and write happens inside that
//! socket's turn in the ready list, so no two pieces of logic ever touch
//! the same connection concurrently and no locking exists anywhere.

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: the service callback contract.
pub mod application;

/// Infrastructure layer: connections and the readiness event loop.
pub mod infrastructure;

pub use application::{EchoService, Service};
pub use domain::ServerConfig;
pub use infrastructure::{Connection, Reactor, ServerError};
