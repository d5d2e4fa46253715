//! In-process transport built on unbounded channels.
//!
//! A [`LoopbackListener`] plays the server side and hands out
//! [`LoopbackConnector`]s for clients. Events flow exactly as they would
//! over a socket, minus the bytes on the wire, which makes whole sessions
//! reproducible in tests. Dropping a client endpoint is seen by the server
//! as a `Disconnect`, the same way a vanished peer would be.

use super::{ClientTransport, ConnectionId, ServerTransport, TransportEvent};
use crate::error::TransportError;
use log::debug;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

struct PendingConnection {
    to_client: UnboundedSender<TransportEvent>,
    from_client: UnboundedReceiver<TransportEvent>,
}

struct Link {
    to_client: UnboundedSender<TransportEvent>,
    from_client: UnboundedReceiver<TransportEvent>,
}

/// Creates a listener and the connector clients use to reach it.
pub fn listener() -> (LoopbackListener, LoopbackConnector) {
    let (pending_tx, pending_rx) = mpsc::unbounded_channel();
    (
        LoopbackListener {
            pending: pending_rx,
            links: HashMap::new(),
            next_id: 0,
        },
        LoopbackConnector { pending: pending_tx },
    )
}

pub struct LoopbackListener {
    pending: UnboundedReceiver<PendingConnection>,
    links: HashMap<ConnectionId, Link>,
    next_id: u32,
}

impl LoopbackListener {
    /// Number of connections the listener still considers live.
    pub fn live_count(&self) -> usize {
        self.links.len()
    }
}

impl ServerTransport for LoopbackListener {
    fn accept(&mut self) -> Option<ConnectionId> {
        let pending = self.pending.try_recv().ok()?;
        let conn = ConnectionId(self.next_id);
        self.next_id += 1;

        // The client may already be gone; its Disconnect is queued behind this.
        let _ = pending.to_client.send(TransportEvent::Connect);
        self.links.insert(
            conn,
            Link {
                to_client: pending.to_client,
                from_client: pending.from_client,
            },
        );
        debug!("Loopback accepted connection {}", conn);
        Some(conn)
    }

    fn pop_event(&mut self, conn: ConnectionId) -> TransportEvent {
        let Some(link) = self.links.get_mut(&conn) else {
            return TransportEvent::Empty;
        };

        match link.from_client.try_recv() {
            Ok(TransportEvent::Disconnect) | Err(TryRecvError::Disconnected) => {
                self.links.remove(&conn);
                TransportEvent::Disconnect
            }
            Ok(event) => event,
            Err(TryRecvError::Empty) => TransportEvent::Empty,
        }
    }

    fn send(&mut self, conn: ConnectionId, payload: &[u8]) -> Result<(), TransportError> {
        let link = self
            .links
            .get(&conn)
            .ok_or(TransportError::NotConnected(conn))?;
        link.to_client
            .send(TransportEvent::Data(payload.to_vec()))
            .map_err(|_| TransportError::NotConnected(conn))
    }

    fn is_live(&self, conn: ConnectionId) -> bool {
        self.links.contains_key(&conn)
    }

    fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(link) = self.links.remove(&conn) {
            let _ = link.to_client.send(TransportEvent::Disconnect);
        }
    }
}

#[derive(Clone)]
pub struct LoopbackConnector {
    pending: UnboundedSender<PendingConnection>,
}

impl LoopbackConnector {
    /// Opens a connection. `Connect` is delivered once the listener accepts
    /// it; if the listener is gone the client sees `Disconnect` instead.
    pub fn connect(&self) -> LoopbackClient {
        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, inbound) = mpsc::unbounded_channel();

        if let Err(mpsc::error::SendError(pending)) = self.pending.send(PendingConnection {
            to_client,
            from_client,
        }) {
            let _ = pending.to_client.send(TransportEvent::Disconnect);
        }

        LoopbackClient {
            inbound,
            outbound: to_server,
            live: true,
        }
    }
}

pub struct LoopbackClient {
    inbound: UnboundedReceiver<TransportEvent>,
    outbound: UnboundedSender<TransportEvent>,
    live: bool,
}

impl ClientTransport for LoopbackClient {
    fn pop_event(&mut self) -> TransportEvent {
        if !self.live {
            return TransportEvent::Empty;
        }

        match self.inbound.try_recv() {
            Ok(TransportEvent::Disconnect) | Err(TryRecvError::Disconnected) => {
                self.live = false;
                TransportEvent::Disconnect
            }
            Ok(event) => event,
            Err(TryRecvError::Empty) => TransportEvent::Empty,
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.live {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(TransportEvent::Data(payload.to_vec()))
            .map_err(|_| TransportError::Closed)
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn disconnect(&mut self) {
        if self.live {
            let _ = self.outbound.send(TransportEvent::Disconnect);
            self.live = false;
        }
    }
}

impl Drop for LoopbackClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
