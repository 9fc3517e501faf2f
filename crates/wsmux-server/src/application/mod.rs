//! Application layer for wsmux-server.
//!
//! Holds the [`Service`] callback contract — the boundary between the
//! protocol core and whatever business logic sits on top of it — and the
//! bundled [`EchoService`] demonstration implementation.

pub mod service;

pub use service::{EchoService, Service};
