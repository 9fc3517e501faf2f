//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments (see `main.rs`) or from defaults
//! suitable for local development and tests. Keeping configuration as a
//! plain struct — no global state, no environment reads inside the domain —
//! makes the reactor easy to embed in tests.

use std::net::SocketAddr;

/// Default listening port, matching the conventional wsmux deployment.
pub const DEFAULT_PORT: u16 = 7000;

/// Fixed receive buffer size for both handshake and frame reads.
///
/// A single readiness event is served by a single read of at most this many
/// bytes; larger handshakes or frames are a documented limitation.
pub const RECV_BUFFER_SIZE: usize = 8192;

/// All runtime configuration for the WebSocket server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port the listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any interface; tests bind
    /// `127.0.0.1:0` to get an ephemeral local port.
    pub bind_addr: SocketAddr,

    /// Size of the per-read receive buffer in bytes.
    pub recv_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address literal.
            bind_addr: ([0, 0, 0, 0], DEFAULT_PORT).into(),
            recv_buffer_size: RECV_BUFFER_SIZE,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
