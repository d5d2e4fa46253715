//! Transport boundary between the protocol core and the network.
//!
//! Both sides poll their transport from a single cooperative loop: nothing
//! here blocks. Receives return [`TransportEvent::Empty`] when nothing is
//! pending and sends only queue bytes. Each `send` carries exactly one
//! encoded message and each `Data` event delivers exactly one.

use crate::error::TransportError;
use std::fmt;

pub mod loopback;
pub mod tcp;

/// Server-side handle for one accepted connection. Never reused by a
/// transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The outbound connection was established (client side only).
    Connect,
    /// One complete application message.
    Data(Vec<u8>),
    /// The connection ended. Reported once; nothing follows it.
    Disconnect,
    /// Nothing pending.
    Empty,
}

pub trait ServerTransport {
    /// Takes the next pending incoming connection, if any.
    fn accept(&mut self) -> Option<ConnectionId>;

    /// Pops the oldest pending event for `conn`, in arrival order.
    fn pop_event(&mut self, conn: ConnectionId) -> TransportEvent;

    /// Queues one message for `conn`.
    fn send(&mut self, conn: ConnectionId, payload: &[u8]) -> Result<(), TransportError>;

    fn is_live(&self, conn: ConnectionId) -> bool;

    /// Closes `conn` from the server side. Already queued sends are still
    /// delivered where the transport can manage it.
    fn disconnect(&mut self, conn: ConnectionId);
}

pub trait ClientTransport {
    fn pop_event(&mut self) -> TransportEvent;

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    fn is_live(&self) -> bool;

    fn disconnect(&mut self);
}
