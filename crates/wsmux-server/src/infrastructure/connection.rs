//! One accepted socket bound to one remote address.
//!
//! A [`Connection`] owns its non-blocking TCP stream and exposes the
//! connection lifecycle in terms of application payloads rather than raw
//! socket bytes:
//!
//! - [`perform_handshake`](Connection::perform_handshake) drives the
//!   RFC 6455 upgrade when the first readiness event arrives,
//! - [`receive`](Connection::receive) turns one readiness event into one
//!   decoded payload (or a disconnect),
//! - [`send`](Connection::send) encodes a payload into an outbound frame
//!   and writes it.
//!
//! Connections are owned exclusively by the reactor: they are created on
//! accept, registered together with their poll interest, and destroyed
//! (socket closed, registry entry removed) on disconnect or a failed
//! handshake. Nothing here is shared across threads.

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::net::TcpStream;
use tracing::{debug, trace, warn};

use wsmux_core::{decode_frame, encode_frame, HandshakeRequest};

/// Protocol phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    /// Accepted, waiting for the client's upgrade request.
    Handshaking,
    /// Handshake completed; exchanging data frames.
    Open,
}

/// Result of driving the opening handshake on a readiness event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Valid upgrade request received and the 101 response written; the
    /// connection is now open.
    Complete,
    /// Nothing to read yet (spurious wakeup); stay in the handshake phase.
    Pending,
    /// Invalid request, peer closed, or socket error. Nothing was sent;
    /// the caller must discard the socket.
    Rejected,
}

/// Result of a single read on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// One decoded, unmasked application payload.
    Message(Vec<u8>),
    /// Nothing to read after all (spurious wakeup); connection stays open.
    Nothing,
    /// Peer closed, socket error, or an undecodable chunk — all terminal
    /// for this connection, never retried.
    Disconnected,
}

/// One live client socket with its handshake state.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ConnectionState,
}

impl Connection {
    /// Wraps a freshly accepted socket. The connection starts in the
    /// handshake phase.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            state: ConnectionState::Handshaking,
        }
    }

    /// The remote address this socket was accepted from.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// True once the opening handshake has completed.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Mutable access to the underlying stream for poll registration.
    pub(crate) fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Drives the opening handshake: one read of up to `buffer_size`
    /// bytes, parse, validate, respond.
    ///
    /// On an invalid or unparseable request nothing is written back — the
    /// refusal a client observes is simply its socket closing. A
    /// request larger than `buffer_size` cannot complete the handshake;
    /// single-read framing is a documented limitation.
    pub fn perform_handshake(&mut self, buffer_size: usize) -> HandshakeOutcome {
        debug_assert_eq!(self.state, ConnectionState::Handshaking);

        let mut buf = vec![0u8; buffer_size];
        let n = match self.stream.read(&mut buf) {
            Ok(0) => {
                debug!("{}: peer closed during handshake", self.peer_addr);
                return HandshakeOutcome::Rejected;
            }
            Ok(n) => n,
            Err(ref e) if would_block(e) => return HandshakeOutcome::Pending,
            Err(e) => {
                debug!("{}: read error during handshake: {e}", self.peer_addr);
                return HandshakeOutcome::Rejected;
            }
        };

        let request = HandshakeRequest::parse(&buf[..n]);
        let response = match request.response() {
            Ok(response) => response,
            Err(e) => {
                debug!("{}: handshake refused: {e}", self.peer_addr);
                return HandshakeOutcome::Rejected;
            }
        };

        // Best-effort single write, like every other send on this socket.
        if let Err(e) = self.stream.write(response.as_bytes()) {
            debug!("{}: failed to write handshake response: {e}", self.peer_addr);
            return HandshakeOutcome::Rejected;
        }

        self.state = ConnectionState::Open;
        HandshakeOutcome::Complete
    }

    /// Encodes `payload` into an outbound frame and writes it with a
    /// single `write` call.
    ///
    /// # Errors
    ///
    /// Returns the socket-level error unchanged; this layer neither
    /// retries nor interprets write failures. A partial write is reported
    /// at trace level and otherwise treated as success — a known
    /// limitation of the single-write contract.
    pub fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let frame = encode_frame(payload);
        let written = self.stream.write(&frame)?;
        if written < frame.len() {
            trace!(
                "{}: short write ({written} of {} bytes)",
                self.peer_addr,
                frame.len()
            );
        }
        Ok(())
    }

    /// Performs a single read and decodes the chunk as one inbound frame.
    ///
    /// An empty read, any socket-level error, and an undecodable chunk are
    /// all reported as [`ReadEvent::Disconnected`]; every read anomaly is
    /// terminal for the connection.
    pub fn receive(&mut self, buffer_size: usize) -> ReadEvent {
        debug_assert_eq!(self.state, ConnectionState::Open);

        let mut buf = vec![0u8; buffer_size];
        let n = match self.stream.read(&mut buf) {
            Ok(0) => return ReadEvent::Disconnected,
            Ok(n) => n,
            Err(ref e) if would_block(e) => return ReadEvent::Nothing,
            Err(e) => {
                debug!("{}: read error: {e}", self.peer_addr);
                return ReadEvent::Disconnected;
            }
        };

        match decode_frame(&buf[..n]) {
            Ok(payload) => ReadEvent::Message(payload),
            Err(e) => {
                warn!("{}: undecodable frame ({e}); dropping connection", self.peer_addr);
                ReadEvent::Disconnected
            }
        }
    }
}

/// True for the error kinds a non-blocking read reports when there is
/// simply nothing to read yet.
fn would_block(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
