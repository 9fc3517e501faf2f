//! RFC 6455 opening handshake: request parsing, validation, and the
//! `101 Switching Protocols` response.
//!
//! The client opens a WebSocket connection by sending an HTTP request:
//!
//! ```text
//! GET /chat HTTP/1.1
//! Host: example.com
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Version: 13
//! ```
//!
//! The server answers with a fixed response whose only variable part is the
//! `Sec-WebSocket-Accept` header: the base64-encoded SHA-1 digest of the
//! client key concatenated with a magic GUID. Computing that digest is the
//! proof that the server speaks WebSocket rather than plain HTTP.
//!
//! Parsing here is deliberately tolerant: only the two `Sec-WebSocket-*`
//! headers are ever inspected, the request line is not validated, and lines
//! that do not look like `Name: value` are skipped rather than rejected.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// The fixed GUID every RFC 6455 server appends to the client key before
/// hashing. The value is defined by the RFC and never changes.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The only protocol version this server accepts. Compared as a string,
/// exactly as it appears on the wire; `"013"` or `" 13"` are not version 13.
pub const WEBSOCKET_VERSION: &str = "13";

/// Header carrying the client's handshake nonce.
pub const KEY_HEADER: &str = "Sec-WebSocket-Key";

/// Header carrying the client's protocol version.
pub const VERSION_HEADER: &str = "Sec-WebSocket-Version";

/// Errors that make an upgrade request unacceptable.
///
/// These are expected, recoverable outcomes: the server refuses the upgrade
/// and discards the socket, nothing more.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// A required header is absent from the request.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The client requested a protocol version other than `"13"`.
    #[error("unsupported websocket version: {0:?}")]
    UnsupportedVersion(String),
}

/// A parsed WebSocket upgrade request.
///
/// Built once from the first bytes received on a new connection and
/// immutable afterwards.
///
/// # Examples
///
/// ```rust
/// use wsmux_core::HandshakeRequest;
///
/// let raw = b"GET / HTTP/1.1\r\n\
///             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
///             Sec-WebSocket-Version: 13\r\n\r\n";
/// let request = HandshakeRequest::parse(raw);
/// assert!(request.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    /// Header name → value. Insertion order is irrelevant; a duplicated
    /// header name keeps the last value seen.
    headers: HashMap<String, String>,
}

impl HandshakeRequest {
    /// Parses a raw request blob into a header map.
    ///
    /// Each line is split once on `": "`. Lines without that separator
    /// (the `GET` request line, blank lines, garbage) are skipped — tolerant
    /// parsing never aborts. Bytes that are not valid UTF-8 are replaced
    /// lossily, which at worst makes a header value fail the later string
    /// comparison.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut headers = HashMap::new();
        for line in text.lines() {
            if let Some((name, value)) = line.split_once(": ") {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        Self { headers }
    }

    /// Returns the value of a header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Checks that the request is an acceptable upgrade request.
    ///
    /// Acceptable means both required headers are present and the version
    /// is exactly `"13"`. All other header content is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError`] naming the first failed requirement.
    pub fn validate(&self) -> Result<(), HandshakeError> {
        let version = self
            .header(VERSION_HEADER)
            .ok_or(HandshakeError::MissingHeader(VERSION_HEADER))?;
        if version != WEBSOCKET_VERSION {
            return Err(HandshakeError::UnsupportedVersion(version.to_string()));
        }
        if self.header(KEY_HEADER).is_none() {
            return Err(HandshakeError::MissingHeader(KEY_HEADER));
        }
        Ok(())
    }

    /// Convenience wrapper over [`validate`](Self::validate).
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Renders the complete `101 Switching Protocols` response.
    ///
    /// The response is byte-exact: the fixed status line, the fixed
    /// `Upgrade` and `Connection` headers, the computed accept key, and a
    /// terminating blank line. No other headers are emitted.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError`] if the request would not pass
    /// [`validate`](Self::validate); a response must never be produced for
    /// an invalid request.
    pub fn response(&self) -> Result<String, HandshakeError> {
        self.validate()?;
        // validate() guarantees the key header is present.
        let key = self
            .header(KEY_HEADER)
            .ok_or(HandshakeError::MissingHeader(KEY_HEADER))?;
        Ok(format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            accept_key(key)
        ))
    }
}

/// Computes the `Sec-WebSocket-Accept` value for a client key.
///
/// `base64(sha1(key ++ GUID))` — a pure, deterministic function of the key.
/// The canonical RFC 6455 test vector:
///
/// ```rust
/// use wsmux_core::accept_key;
///
/// assert_eq!(
///     accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
///     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
/// );
/// ```
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A well-formed upgrade request using the RFC 6455 sample key.
    const VALID_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
        Host: server.example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    #[test]
    fn test_parse_extracts_headers() {
        let request = HandshakeRequest::parse(VALID_REQUEST);
        assert_eq!(
            request.header(KEY_HEADER),
            Some("dGhlIHNhbXBsZSBub25jZQ==")
        );
        assert_eq!(request.header(VERSION_HEADER), Some("13"));
        assert_eq!(request.header("Host"), Some("server.example.com"));
    }

    #[test]
    fn test_parse_skips_request_line() {
        // "GET /chat HTTP/1.1" has no ": " separator and must be ignored.
        let request = HandshakeRequest::parse(VALID_REQUEST);
        assert_eq!(request.header("GET /chat HTTP/1.1"), None);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let raw = b"garbage without separator\r\n\
            Sec-WebSocket-Key: abc\r\n\
            also:no-space-separator\r\n\
            Sec-WebSocket-Version: 13\r\n";
        let request = HandshakeRequest::parse(raw);
        assert!(request.is_valid());
        // "also:no-space-separator" lacks the ": " separator — skipped.
        assert_eq!(request.header("also"), None);
    }

    #[test]
    fn test_parse_duplicate_header_keeps_last_value() {
        let raw = b"X-Test: first\r\nX-Test: second\r\n";
        let request = HandshakeRequest::parse(raw);
        assert_eq!(request.header("X-Test"), Some("second"));
    }

    #[test]
    fn test_parse_empty_input_yields_invalid_request() {
        let request = HandshakeRequest::parse(b"");
        assert!(!request.is_valid());
    }

    #[test]
    fn test_validate_accepts_valid_request() {
        let request = HandshakeRequest::parse(VALID_REQUEST);
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        let raw = b"Sec-WebSocket-Version: 13\r\n";
        let request = HandshakeRequest::parse(raw);
        assert_eq!(
            request.validate(),
            Err(HandshakeError::MissingHeader(KEY_HEADER))
        );
    }

    #[test]
    fn test_validate_rejects_missing_version() {
        let raw = b"Sec-WebSocket-Key: abc\r\n";
        let request = HandshakeRequest::parse(raw);
        assert_eq!(
            request.validate(),
            Err(HandshakeError::MissingHeader(VERSION_HEADER))
        );
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        let raw = b"Sec-WebSocket-Key: abc\r\nSec-WebSocket-Version: 8\r\n";
        let request = HandshakeRequest::parse(raw);
        assert_eq!(
            request.validate(),
            Err(HandshakeError::UnsupportedVersion("8".to_string()))
        );
    }

    #[test]
    fn test_validate_version_is_string_equality_not_numeric() {
        // "013" parses numerically to 13 but must still be rejected.
        let raw = b"Sec-WebSocket-Key: abc\r\nSec-WebSocket-Version: 013\r\n";
        let request = HandshakeRequest::parse(raw);
        assert!(!request.is_valid());
    }

    #[test]
    fn test_validate_ignores_header_order_and_extras() {
        let raw = b"Sec-WebSocket-Version: 13\r\n\
            X-Whatever: anything at all\r\n\
            Sec-WebSocket-Key: abc\r\n\
            Cookie: session=123\r\n";
        let request = HandshakeRequest::parse(raw);
        assert!(request.is_valid());
    }

    #[test]
    fn test_accept_key_matches_rfc6455_vector() {
        // The canonical test vector from RFC 6455 §1.3.
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_accept_key_is_deterministic() {
        let first = accept_key("a-key");
        let second = accept_key("a-key");
        assert_eq!(first, second);
    }

    #[test]
    fn test_response_contains_accept_key_and_terminator() {
        let request = HandshakeRequest::parse(VALID_REQUEST);
        let response = request.response().unwrap();
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Upgrade: websocket\r\n"));
        assert!(response.contains("Connection: Upgrade\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_emits_no_other_headers() {
        let request = HandshakeRequest::parse(VALID_REQUEST);
        let response = request.response().unwrap();
        // Exactly four lines: status + three headers, then the blank line.
        let lines: Vec<&str> = response.trim_end().lines().collect();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_response_fails_for_invalid_request() {
        let request = HandshakeRequest::parse(b"Sec-WebSocket-Version: 13\r\n");
        assert!(request.response().is_err());
    }
}
