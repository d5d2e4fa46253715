//! Periodic full-state broadcast.
//!
//! Every `BROADCAST_INTERVAL` the server copies the registry and sends the
//! same `ServerUpdate` to every live connection. Players receive their own
//! entry too; clients skip it.

use crate::registry::SessionRegistry;
use log::{debug, error, info};
use shared::{ConnectionId, Message, Periodic, ServerTransport, Snapshot, BROADCAST_INTERVAL};
use std::time::Instant;

pub struct SnapshotBroadcaster {
    timer: Periodic,
    ticks: u64,
}

impl SnapshotBroadcaster {
    pub fn new() -> Self {
        Self {
            timer: Periodic::new(BROADCAST_INTERVAL),
            ticks: 0,
        }
    }

    /// Starts broadcasting. Does nothing if already running.
    pub fn start(&mut self, now: Instant) {
        if !self.timer.is_running() {
            info!(
                "Starting snapshot broadcast every {:?}",
                self.timer.period()
            );
            self.timer.start(now);
        }
    }

    pub fn stop(&mut self) {
        if self.timer.is_running() {
            info!("Stopping snapshot broadcast after {} ticks", self.ticks);
            self.timer.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Number of broadcast ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Broadcasts a snapshot to `targets` if one is due. Returns the number
    /// of sends performed.
    pub fn poll<T, I>(
        &mut self,
        now: Instant,
        registry: &SessionRegistry,
        targets: I,
        transport: &mut T,
    ) -> usize
    where
        T: ServerTransport,
        I: IntoIterator<Item = ConnectionId>,
    {
        if !self.timer.poll(now) {
            return 0;
        }
        self.ticks += 1;
        broadcast(registry.snapshot(), targets, transport)
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends one `ServerUpdate` carrying `players` to each target the transport
/// still considers live. Dead targets are skipped, never retried.
pub fn broadcast<T, I>(players: Snapshot, targets: I, transport: &mut T) -> usize
where
    T: ServerTransport,
    I: IntoIterator<Item = ConnectionId>,
{
    let player_count = players.len();
    let payload = match (Message::ServerUpdate { players }).encode() {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to encode server update: {}", e);
            return 0;
        }
    };

    let mut sent = 0;
    for conn in targets {
        if !transport.is_live(conn) {
            continue;
        }
        match transport.send(conn, &payload) {
            Ok(()) => sent += 1,
            Err(e) => debug!("Skipping server update for {}: {}", conn, e),
        }
    }

    debug!(
        "Server update with {} players sent to {} connections",
        player_count, sent
    );
    sent
}
