//! # wsmux-core
//!
//! Shared protocol library for wsmux containing the RFC 6455 opening
//! handshake codec and the data-frame codec.
//!
//! This crate is pure byte manipulation: it has zero dependencies on
//! sockets, threads, or any I/O. The server crate (`wsmux-server`) feeds it
//! received byte chunks and writes its output back to the wire.
//!
//! # Architecture overview
//!
//! A WebSocket connection has two phases, and this crate covers the wire
//! format of both:
//!
//! - **`protocol::handshake`** – The HTTP-based upgrade exchange. The client
//!   sends an HTTP request carrying a `Sec-WebSocket-Key`; the server proves
//!   it understood by answering `101 Switching Protocols` with the derived
//!   `Sec-WebSocket-Accept` digest.
//!
//! - **`protocol::frame`** – After the upgrade, both sides exchange frames:
//!   a length-prefixed payload, XOR-masked in the client-to-server direction
//!   and unmasked in the server-to-client direction.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `wsmux_core::decode_frame` instead of `wsmux_core::protocol::frame::decode_frame`.
pub use protocol::frame::{apply_mask, decode_frame, encode_frame, FrameError};
pub use protocol::handshake::{accept_key, HandshakeError, HandshakeRequest};
