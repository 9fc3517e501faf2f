//! WebSocket data-frame codec: encoding outbound frames and decoding
//! inbound ones.
//!
//! Wire format (RFC 6455 §5.2):
//!
//! ```text
//! [fin/rsv/opcode:1][mask-bit + len:1][extended len:0|2|8][mask:0|4][payload:N]
//! ```
//!
//! The 7-bit length field in the second byte either holds the payload length
//! directly (< 126), or the marker `126` followed by a 2-byte big-endian
//! length, or the marker `127` followed by an 8-byte big-endian length.
//!
//! Direction matters:
//!
//! - **Outbound (server → client)**: a single complete frame with a fixed
//!   first byte (`FIN` set, data opcode), never masked.
//! - **Inbound (client → server)**: always masked; the 4-byte mask key sits
//!   immediately before the payload and every payload byte is XORed with
//!   `mask[i % 4]`.
//!
//! The decoder works on one already-received chunk and treats everything
//! after the mask key as payload. The extended length bytes are skipped
//! positionally but their numeric value is not used to bound the payload,
//! so a frame split across reads, or two frames in one read, will not be
//! reassembled or separated. That single-read framing assumption holds for
//! small interactive payloads and is a documented limitation of this codec,
//! not something callers can configure away.
//!
//! FIN, RSV, and opcode bits of inbound frames are not inspected;
//! fragmentation and control frames (ping/pong/close) are out of scope.

use thiserror::Error;

/// The fixed first byte of every outbound frame: FIN=1, RSV=0, data opcode.
/// Kept at this exact value for wire compatibility.
pub const FRAME_HEAD: u8 = 0x81;

/// Mask over the second byte that drops the mask bit and keeps the 7-bit
/// length indicator.
pub const LENGTH_MASK: u8 = 0x7F;

/// Length-indicator marker for a 2-byte extended length.
const TWO_BYTE_LENGTH: u8 = 126;

/// Length-indicator marker for an 8-byte extended length.
const EIGHT_BYTE_LENGTH: u8 = 127;

/// Size of the client masking key in bytes.
pub const MASK_LEN: usize = 4;

/// Errors that can occur while decoding an inbound frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The received chunk is shorter than the frame header and mask key.
    #[error("truncated frame: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes an application payload into a single outbound frame.
///
/// The result is `header ++ payload`: the fixed [`FRAME_HEAD`] byte, the
/// length encoding chosen by payload size, and the payload verbatim. Server
/// frames are never masked, so no mask bit is set and no mask key is
/// emitted.
///
/// # Examples
///
/// ```rust
/// use wsmux_core::encode_frame;
///
/// assert_eq!(encode_frame(b"hello"), b"\x81\x05hello");
/// ```
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 10);
    frame.push(FRAME_HEAD);

    if len < TWO_BYTE_LENGTH as usize {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(TWO_BYTE_LENGTH);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(EIGHT_BYTE_LENGTH);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    frame.extend_from_slice(payload);
    frame
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decodes one inbound (masked) frame from a received chunk, returning the
/// unmasked payload.
///
/// The 7-bit length indicator selects where the mask key and payload begin;
/// the mask key is always the [`MASK_LEN`] bytes immediately preceding the
/// payload. Everything after the mask key is treated as payload — the
/// declared length is not used to bound it (see the module docs for why).
///
/// # Errors
///
/// Returns [`FrameError::Truncated`] if the chunk ends before the payload
/// would begin. An empty payload is valid.
pub fn decode_frame(raw: &[u8]) -> Result<Vec<u8>, FrameError> {
    if raw.len() < 2 {
        return Err(FrameError::Truncated {
            needed: 2,
            available: raw.len(),
        });
    }

    let length_indicator = raw[1] & LENGTH_MASK;
    let (mask_start, payload_start) = match length_indicator {
        TWO_BYTE_LENGTH => (4, 8),
        EIGHT_BYTE_LENGTH => (10, 14),
        _ => (2, 6),
    };

    if raw.len() < payload_start {
        return Err(FrameError::Truncated {
            needed: payload_start,
            available: raw.len(),
        });
    }

    let mask: [u8; MASK_LEN] = raw[mask_start..mask_start + MASK_LEN]
        .try_into()
        .expect("mask slice is exactly MASK_LEN bytes");

    let mut payload = raw[payload_start..].to_vec();
    apply_mask(&mut payload, mask);
    Ok(payload)
}

/// XORs `bytes` in place with the repeating 4-byte mask key.
///
/// Masking and unmasking are the same operation: applying the same mask
/// twice restores the original bytes.
pub fn apply_mask(bytes: &mut [u8], mask: [u8; MASK_LEN]) {
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte ^= mask[i % MASK_LEN];
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
