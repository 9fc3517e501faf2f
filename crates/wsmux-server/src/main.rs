//! wsmux-server — entry point.
//!
//! Binds a TCP listener, upgrades incoming connections via the RFC 6455
//! opening handshake, and echoes every received payload back through the
//! bundled [`EchoService`]. Replace the service to put real business logic
//! behind the same three-callback contract.
//!
//! # Usage
//!
//! ```text
//! wsmux-server [OPTIONS]
//!
//! Options:
//!   --port <PORT>   TCP port to listen on [default: 7000]
//!   --bind <ADDR>   IP address to bind [default: 0.0.0.0]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable     | Default   | Description          |
//! |--------------|-----------|----------------------|
//! | `WSMUX_PORT` | `7000`    | Listener port        |
//! | `WSMUX_BIND` | `0.0.0.0` | Listener bind address |
//!
//! Log verbosity is controlled by `RUST_LOG` (e.g. `RUST_LOG=debug`).

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wsmux_server::domain::config::RECV_BUFFER_SIZE;
use wsmux_server::{EchoService, Reactor, ServerConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Minimal readiness-multiplexing WebSocket server.
#[derive(Debug, Parser)]
#[command(
    name = "wsmux-server",
    about = "Minimal single-threaded WebSocket echo server",
    version
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 7000, env = "WSMUX_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "WSMUX_BIND")]
    bind: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;
        Ok(ServerConfig {
            bind_addr,
            recv_buffer_size: RECV_BUFFER_SIZE,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls filtering; absent or invalid falls back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    let mut reactor = Reactor::bind(&config, EchoService)
        .with_context(|| format!("failed to start server on {}", config.bind_addr))?;

    // Runs forever; only fatal server errors escape.
    reactor.run().context("server loop failed")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_port_is_7000() {
        let cli = Cli::parse_from(["wsmux-server"]);
        assert_eq!(cli.port, 7000);
    }

    #[test]
    fn test_cli_default_bind_is_any_interface() {
        let cli = Cli::parse_from(["wsmux-server"]);
        assert_eq!(cli.bind, "0.0.0.0");
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["wsmux-server", "--port", "9999"]);
        assert_eq!(cli.port, 9999);
    }

    #[test]
    fn test_cli_bind_override() {
        let cli = Cli::parse_from(["wsmux-server", "--bind", "127.0.0.1"]);
        assert_eq!(cli.bind, "127.0.0.1");
    }

    #[test]
    fn test_into_server_config_defaults() {
        let cli = Cli::parse_from(["wsmux-server"]);
        let config = cli.into_server_config().unwrap();
        assert_eq!(config.bind_addr.port(), 7000);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.recv_buffer_size, RECV_BUFFER_SIZE);
    }

    #[test]
    fn test_into_server_config_custom_addr() {
        let cli = Cli::parse_from(["wsmux-server", "--bind", "127.0.0.1", "--port", "8080"]);
        let config = cli.into_server_config().unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_into_server_config_invalid_bind_returns_error() {
        let cli = Cli {
            port: 7000,
            bind: "not.an.ip".to_string(),
        };
        assert!(cli.into_server_config().is_err());
    }
}
