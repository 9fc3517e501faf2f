//! Protocol module containing the handshake codec and the frame codec.

pub mod frame;
pub mod handshake;

pub use frame::{apply_mask, decode_frame, encode_frame, FrameError};
pub use handshake::{accept_key, HandshakeError, HandshakeRequest};
