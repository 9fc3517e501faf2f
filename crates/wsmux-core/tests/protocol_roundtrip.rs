//! Integration tests for the wsmux-core protocol codecs.
//!
//! These tests exercise the handshake codec and the frame codec together
//! through the public API: the accept-key derivation against the canonical
//! RFC 6455 vector, and masked round-trips across every length-encoding
//! boundary.

use wsmux_core::{
    accept_key, apply_mask, decode_frame, encode_frame, FrameError, HandshakeError,
    HandshakeRequest,
};

/// Turns an outbound (unmasked) frame into the masked client-to-server form
/// of the same payload: set the mask bit, splice in the mask key, and mask
/// the payload bytes.
fn mask_as_client_frame(server_frame: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let header_len = match server_frame[1] {
        126 => 4,
        127 => 10,
        _ => 2,
    };
    let mut frame = server_frame[..header_len].to_vec();
    frame[1] |= 0x80;
    frame.extend_from_slice(&mask);
    let mut payload = server_frame[header_len..].to_vec();
    apply_mask(&mut payload, mask);
    frame.extend_from_slice(&payload);
    frame
}

#[test]
fn test_accept_key_rfc6455_canonical_vector() {
    assert_eq!(
        accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
        "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
}

#[test]
fn test_accept_key_applied_twice_yields_same_output() {
    for key in ["", "x", "dGhlIHNhbXBsZSBub25jZQ==", "not-even-base64"] {
        assert_eq!(accept_key(key), accept_key(key), "key={key:?}");
    }
}

#[test]
fn test_full_handshake_request_to_response() {
    let raw = b"GET /chat HTTP/1.1\r\n\
        Host: server.example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Origin: http://example.com\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    let request = HandshakeRequest::parse(raw);
    let response = request.response().expect("valid request must get a response");

    assert_eq!(
        response,
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"
    );
}

#[test]
fn test_handshake_rejects_version_mismatch() {
    let raw = b"Sec-WebSocket-Key: abc\r\nSec-WebSocket-Version: 12\r\n\r\n";
    let request = HandshakeRequest::parse(raw);
    assert_eq!(
        request.validate(),
        Err(HandshakeError::UnsupportedVersion("12".to_string()))
    );
}

#[test]
fn test_handshake_rejects_unparseable_blob() {
    let request = HandshakeRequest::parse(b"\x00\x01\x02 not http at all");
    assert!(!request.is_valid());
}

#[test]
fn test_masked_round_trip_across_length_boundaries() {
    let mask = [0x37, 0xFA, 0x21, 0x3D];
    for len in [0usize, 1, 125, 126, 65535, 65536] {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        let client_frame = mask_as_client_frame(&encode_frame(&payload), mask);
        let decoded = decode_frame(&client_frame).expect("decode must succeed");
        assert_eq!(decoded, payload, "round trip failed for len={len}");
    }
}

#[test]
fn test_masked_round_trip_with_varied_masks() {
    let payload = b"The quick brown fox jumps over the lazy dog";
    for mask in [
        [0x00, 0x00, 0x00, 0x00],
        [0xFF, 0xFF, 0xFF, 0xFF],
        [0x12, 0x34, 0x56, 0x78],
        [0xDE, 0xAD, 0xBE, 0xEF],
    ] {
        let client_frame = mask_as_client_frame(&encode_frame(payload), mask);
        assert_eq!(
            decode_frame(&client_frame).unwrap(),
            payload,
            "mask={mask:02X?}"
        );
    }
}

#[test]
fn test_decode_rejects_chunk_shorter_than_mask() {
    // A 16-bit-extended header that ends inside the mask key.
    let truncated = [0x81u8, 0x80 | 126, 0x00, 0x05, 0xAA, 0xBB];
    assert_eq!(
        decode_frame(&truncated),
        Err(FrameError::Truncated {
            needed: 8,
            available: 6
        })
    );
}

#[test]
fn test_encoded_hello_matches_documented_wire_bytes() {
    assert_eq!(
        encode_frame(b"hello"),
        [0x81, 0x05, b'h', b'e', b'l', b'l', b'o']
    );
}
