//! The service callback contract and the bundled echo service.
//!
//! The reactor core knows nothing about what the payload bytes mean. All
//! business logic lives behind the [`Service`] trait: the reactor invokes
//! its three callbacks at the connection lifecycle points, and the service
//! may reply through the [`Connection`] handle it is given.
//!
//! Callback ordering guarantee, per open connection:
//!
//! 1. exactly one [`on_connect`](Service::on_connect) after a successful
//!    handshake (never for a failed one),
//! 2. zero or more [`on_message`](Service::on_message) calls, one per
//!    successfully decoded inbound frame, in receipt order,
//! 3. exactly one [`on_disconnect`](Service::on_disconnect) when the peer
//!    closes or the socket errors.
//!
//! Callbacks run on the reactor thread; a slow callback stalls the whole
//! loop. Panics raised inside callbacks are not caught.

use tracing::{info, warn};

use crate::infrastructure::connection::Connection;

/// Capability interface through which the reactor notifies the external
/// service of connection lifecycle events.
///
/// Return values are not consumed; a service that wants to reply does so by
/// calling [`Connection::send`] on the handle it receives.
pub trait Service {
    /// A client completed the opening handshake and is now open.
    fn on_connect(&mut self, conn: &mut Connection);

    /// A data frame arrived and was decoded; `payload` is the unmasked
    /// application bytes.
    fn on_message(&mut self, conn: &mut Connection, payload: &[u8]);

    /// The client disconnected. The socket is removed and closed after
    /// this call returns; sending on `conn` is pointless but harmless.
    fn on_disconnect(&mut self, conn: &mut Connection);
}

/// The trivial reference service: echoes every payload back to its sender.
#[derive(Debug, Default)]
pub struct EchoService;

impl Service for EchoService {
    fn on_connect(&mut self, conn: &mut Connection) {
        info!("connected    {}", conn.peer_addr());
    }

    fn on_message(&mut self, conn: &mut Connection, payload: &[u8]) {
        if let Err(e) = conn.send(payload) {
            // The read side will observe the broken socket on its next
            // readiness event and run the disconnect transition.
            warn!("echo to {} failed: {e}", conn.peer_addr());
        }
    }

    fn on_disconnect(&mut self, conn: &mut Connection) {
        info!("disconnected {}", conn.peer_addr());
    }
}
