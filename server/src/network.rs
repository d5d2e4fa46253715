//! Server connection loop: accepts connections, dispatches their messages,
//! and reconciles the registry when they drop.

use crate::broadcaster::SnapshotBroadcaster;
use crate::registry::SessionRegistry;
use log::{debug, error, info, warn};
use shared::{ConnectionId, Message, PlayerId, ServerTransport, TransportEvent};
use std::time::Instant;

/// One accepted connection and the player it owns.
///
/// The player is referenced by id, so reordering either this list or the
/// registry never makes one point at the wrong entry of the other.
#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    player_id: PlayerId,
    /// Cleared once disconnect handling has run; the slot is dropped by the
    /// next cleanup pass.
    live: bool,
}

/// Authoritative server state, driven one tick at a time by the host loop.
pub struct Server<T: ServerTransport> {
    transport: T,
    registry: SessionRegistry,
    connections: Vec<Connection>,
    broadcaster: SnapshotBroadcaster,
    shut_down: bool,
}

impl<T: ServerTransport> Server<T> {
    pub fn new(transport: T) -> Self {
        Self::with_registry(transport, SessionRegistry::new())
    }

    pub fn with_registry(transport: T, registry: SessionRegistry) -> Self {
        Self {
            transport,
            registry,
            connections: Vec::new(),
            broadcaster: SnapshotBroadcaster::new(),
            shut_down: false,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &SnapshotBroadcaster {
        &self.broadcaster
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the number of connections that have not disconnected
    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.live).count()
    }

    /// Player owned by `conn`, if the connection is still live.
    pub fn player_for(&self, conn: ConnectionId) -> Option<&PlayerId> {
        self.connections
            .iter()
            .find(|c| c.live && c.id == conn)
            .map(|c| &c.player_id)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Runs one host tick: cleanup, accept, drain, then the broadcast if due.
    /// Never blocks.
    pub fn tick(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }

        self.cleanup_connections();
        self.accept_connections(now);
        self.drain_events();

        let targets: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.live)
            .map(|c| c.id)
            .collect();
        self.broadcaster
            .poll(now, &self.registry, targets, &mut self.transport);
    }

    /// Drops slots whose disconnect has been handled. Swap-removal reorders
    /// the list, so the scan re-examines the index it just filled.
    fn cleanup_connections(&mut self) {
        let mut i = 0;
        while i < self.connections.len() {
            if self.connections[i].live {
                i += 1;
            } else {
                self.connections.swap_remove(i);
            }
        }
    }

    fn accept_connections(&mut self, now: Instant) {
        while let Some(conn) = self.transport.accept() {
            let player = self.registry.allocate();
            info!("Accepted connection {} as player {}", conn, player.id);

            self.connections.push(Connection {
                id: conn,
                player_id: player.id.clone(),
                live: true,
            });
            send_message(&mut self.transport, conn, &Message::Handshake { player });

            self.broadcaster.start(now);
        }
    }

    fn drain_events(&mut self) {
        for index in 0..self.connections.len() {
            if !self.connections[index].live {
                continue;
            }
            let conn = self.connections[index].id;

            loop {
                match self.transport.pop_event(conn) {
                    TransportEvent::Empty => break,
                    TransportEvent::Data(bytes) => self.handle_data(conn, &bytes),
                    TransportEvent::Disconnect => {
                        self.handle_disconnect(index);
                        break;
                    }
                    TransportEvent::Connect => {
                        debug!("Ignoring connect event on accepted connection {}", conn)
                    }
                }
            }
        }
    }

    fn handle_data(&mut self, conn: ConnectionId, bytes: &[u8]) {
        let message = match Message::decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message from {}: {}", conn, e);
                return;
            }
        };

        match message {
            Message::PlayerUpdate { player } => {
                let pos = player.position;
                debug!(
                    "Player update message received: id({}), pos: ({}, {}, {})",
                    player.id, pos.x, pos.y, pos.z
                );
                self.registry.apply_update(&player.id, pos);
            }
            Message::Handshake { .. } => {
                info!("Handshake message received from {}, ignoring", conn);
            }
            other => {
                warn!(
                    "Unrecognized message {} received from {}",
                    other.command(),
                    conn
                );
            }
        }
    }

    /// Removes the player behind the connection at `index`, tells every other
    /// live connection, then retires the slot. Runs at most once per slot.
    fn handle_disconnect(&mut self, index: usize) {
        let slot = &self.connections[index];
        if !slot.live {
            return;
        }
        let conn = slot.id;
        let player_id = slot.player_id.clone();

        match self.registry.remove_by_id(&player_id) {
            Some(player) => {
                let notice = Message::PlayerDelete { player };
                for other in self.connections.iter().filter(|c| c.live && c.id != conn) {
                    if self.transport.is_live(other.id) {
                        send_message(&mut self.transport, other.id, &notice);
                    }
                }
                info!("Client {} disconnected from server", player_id);
            }
            None => debug!("Player {} was already removed", player_id),
        }

        self.connections[index].live = false;
        self.transport.disconnect(conn);
    }

    /// Disconnects every client and stops the broadcaster. Later ticks are
    /// no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.broadcaster.stop();
        for connection in self.connections.iter_mut().filter(|c| c.live) {
            self.transport.disconnect(connection.id);
            connection.live = false;
        }
        self.connections.clear();
        self.shut_down = true;
        info!("Server shut down");
    }
}

fn send_message<T: ServerTransport>(transport: &mut T, conn: ConnectionId, message: &Message) {
    match message.encode() {
        Ok(payload) => {
            if let Err(e) = transport.send(conn, &payload) {
                debug!("Dropping {} for {}: {}", message.command(), conn, e);
            }
        }
        Err(e) => error!("Failed to encode {}: {}", message.command(), e),
    }
}
