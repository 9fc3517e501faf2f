//! The readiness event loop: one `mio::Poll`, one listener, one registry of
//! live connections.
//!
//! # Per-connection state machine
//!
//! ```text
//! Accepted ──register──▶ Handshaking ──valid request──▶ Open ──peer close──▶ Closed
//!                             │                          │ ▲
//!                             └──invalid request──▶ Closed └─┘ one on_message
//!                                 (no callbacks)              per decoded frame
//! ```
//!
//! - `Handshaking → Open` invokes `Service::on_connect`.
//! - `Handshaking → Closed` (refused upgrade) invokes nothing; the socket
//!   is discarded without ever being visible to the service.
//! - `Open → Closed` invokes `Service::on_disconnect`, then removes and
//!   closes the socket.
//!
//! # Loop algorithm
//!
//! Block on the readiness wait over the full watch set with no timeout;
//! for every socket reported ready, run the accept transition (listener
//! token) or the read/dispatch/disconnect transition (connection token).
//! All ready sockets are processed once per wait cycle. No fairness or
//! priority guarantee beyond the order the readiness primitive reports.
//!
//! # Registry invariant
//!
//! Every registered socket other than the listener has exactly one entry
//! in the connection map and vice versa. The map and the poll registration
//! set are only ever mutated together: register-and-insert on accept,
//! deregister-and-remove on discard.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::Service;
use crate::domain::ServerConfig;
use crate::infrastructure::connection::{Connection, HandshakeOutcome, ReadEvent};

/// Token reserved for the listening socket. Connection tokens start above
/// it and are never reused.
const LISTENER: Token = Token(0);

/// Capacity of the event buffer handed to each readiness wait.
const EVENTS_CAPACITY: usize = 128;

/// Errors that are fatal to the server as a whole.
///
/// Per-connection I/O failures are not represented here — they are
/// terminal for one connection only and are handled inside the loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound (port in use, missing privilege).
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The poll instance could not be created or a socket could not be
    /// registered with it.
    #[error("poll registration failed: {0}")]
    Registration(#[source] io::Error),

    /// The readiness wait itself failed.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),
}

/// What to do with a connection after its readiness event was handled.
enum Disposition {
    Keep,
    Discard,
}

/// The event loop: owns the listener, the poll instance, the connection
/// registry, and the service it notifies.
///
/// Single-threaded and cooperative: every accept, read, and callback runs
/// on the thread that calls [`run`](Reactor::run) (or
/// [`turn`](Reactor::turn)), between readiness waits.
pub struct Reactor<S: Service> {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    local_addr: SocketAddr,
    /// Socket identity → connection. See the module docs for the
    /// invariant tying this to the poll registration set.
    connections: HashMap<Token, Connection>,
    next_token: usize,
    recv_buffer_size: usize,
    service: S,
}

impl<S: Service> Reactor<S> {
    /// Binds the listener, sets up the poll instance, and registers the
    /// listener for readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound and
    /// [`ServerError::Registration`] if poll setup fails.
    pub fn bind(config: &ServerConfig, service: S) -> Result<Self, ServerError> {
        let mut listener = TcpListener::bind(config.bind_addr).map_err(|source| {
            ServerError::Bind {
                addr: config.bind_addr,
                source,
            }
        })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: config.bind_addr,
            source,
        })?;

        let poll = Poll::new().map_err(ServerError::Registration)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(ServerError::Registration)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener,
            local_addr,
            connections: HashMap::new(),
            next_token: LISTENER.0 + 1,
            recv_buffer_size: config.recv_buffer_size,
            service,
        })
    }

    /// The address the listener actually bound — useful when the
    /// configured port was `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently in the registry (handshaking and
    /// open).
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Runs the event loop forever.
    ///
    /// # Errors
    ///
    /// Returns only on a fatal [`ServerError`]; per-connection failures
    /// are absorbed by the loop.
    pub fn run(&mut self) -> Result<(), ServerError> {
        info!("listening on {}", self.local_addr);
        loop {
            self.turn(None)?;
        }
    }

    /// One wait-and-dispatch cycle: block on the readiness wait (bounded
    /// by `timeout`, or indefinitely for `None`), then handle every ready
    /// socket once.
    ///
    /// Public so embedders and tests can drive the loop themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Wait`] if the readiness wait fails.
    pub fn turn(&mut self, timeout: Option<Duration>) -> Result<(), ServerError> {
        if let Err(e) = self.poll.poll(&mut self.events, timeout) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(ServerError::Wait(e));
        }

        // Tokens are collected first because dispatching needs mutable
        // access to the registry the event buffer would otherwise pin.
        let ready: Vec<Token> = self.events.iter().map(|event| event.token()).collect();
        for token in ready {
            if token == LISTENER {
                self.accept_ready();
            } else {
                self.connection_ready(token);
            }
        }
        Ok(())
    }

    // ── Accept transition ─────────────────────────────────────────────────────

    /// Drains the listener: accepts until it reports `WouldBlock`, wrapping
    /// and registering each new socket in the handshake phase.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => self.register_connection(stream, peer_addr),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Transient accept failure (e.g. file-descriptor
                    // exhaustion). Keep serving the sockets we have.
                    error!("accept error: {e}");
                    break;
                }
            }
        }
    }

    /// Registers an accepted socket for readiness and inserts it into the
    /// registry, as one combined step.
    fn register_connection(&mut self, stream: TcpStream, peer_addr: SocketAddr) {
        let token = Token(self.next_token);
        self.next_token += 1;

        let mut conn = Connection::new(stream, peer_addr);
        if let Err(e) = self
            .poll
            .registry()
            .register(conn.stream_mut(), token, Interest::READABLE)
        {
            // Registration failed: drop the socket before it ever enters
            // the registry, keeping the map/watch-set invariant intact.
            warn!("{peer_addr}: poll registration failed: {e}");
            return;
        }

        debug!("{peer_addr}: accepted, awaiting handshake");
        self.connections.insert(token, conn);
    }

    // ── Read / dispatch / disconnect transition ───────────────────────────────

    /// Handles a readiness event for one connection: drive the handshake
    /// if it is still pending, otherwise read one frame and dispatch it.
    fn connection_ready(&mut self, token: Token) {
        let recv_buffer_size = self.recv_buffer_size;

        // The entry can be gone if the connection was discarded earlier in
        // this same wait cycle.
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let disposition = if !conn.is_open() {
            match conn.perform_handshake(recv_buffer_size) {
                HandshakeOutcome::Complete => {
                    info!("{}: handshake complete", conn.peer_addr());
                    self.service.on_connect(conn);
                    Disposition::Keep
                }
                HandshakeOutcome::Pending => Disposition::Keep,
                HandshakeOutcome::Rejected => {
                    // Refused upgrade: discard without notifying the
                    // service — it never learns the socket existed.
                    info!("{}: handshake refused", conn.peer_addr());
                    Disposition::Discard
                }
            }
        } else {
            match conn.receive(recv_buffer_size) {
                ReadEvent::Message(payload) => {
                    debug!("{}: message of {} bytes", conn.peer_addr(), payload.len());
                    self.service.on_message(conn, &payload);
                    Disposition::Keep
                }
                ReadEvent::Nothing => Disposition::Keep,
                ReadEvent::Disconnected => {
                    debug!("{}: disconnected", conn.peer_addr());
                    self.service.on_disconnect(conn);
                    Disposition::Discard
                }
            }
        };

        if let Disposition::Discard = disposition {
            self.discard(token);
        }
    }

    /// Removes a connection from the registry and the watch set together;
    /// dropping the connection closes its socket.
    fn discard(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            if let Err(e) = self.poll.registry().deregister(conn.stream_mut()) {
                debug!("{}: deregister failed: {e}", conn.peer_addr());
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
