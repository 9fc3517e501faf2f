//! Infrastructure layer for wsmux-server.
//!
//! All I/O lives here: the non-blocking TCP types, the per-connection
//! handshake/read/write logic, and the readiness event loop that drives
//! everything.

pub mod connection;
pub mod reactor;

pub use connection::{Connection, HandshakeOutcome, ReadEvent};
pub use reactor::{Reactor, ServerError};
