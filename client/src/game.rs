//! Client-side mirror of the shared world.
//!
//! The client keeps one mutable copy of its own player, whose position it
//! owns between self-reports, and read-only mirrors of everyone else.
//! Snapshots create and move mirrors; only an explicit `PlayerDelete`
//! removes one. A player missing from a snapshot is left alone.

use log::{debug, info};
use shared::{PlayerId, PlayerState, Rgb, Snapshot, Vec3};

/// Receives create/update/destroy requests for the visual object that
/// represents each player. Objects are keyed by player id.
pub trait VisualSink {
    fn create(&mut self, id: &str, color: Rgb, position: Vec3);
    fn update(&mut self, id: &str, position: Vec3);
    fn destroy(&mut self, id: &str);
}

/// What a snapshot did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped_self: usize,
}

#[derive(Debug, Default)]
pub struct ClientGameState {
    /// Our own player, known once the handshake arrives
    local: Option<PlayerState>,
    /// Everyone else, in no particular order
    remotes: Vec<PlayerState>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player(&self) -> Option<&PlayerState> {
        self.local.as_ref()
    }

    pub fn local_id(&self) -> Option<&PlayerId> {
        self.local.as_ref().map(|player| &player.id)
    }

    pub fn remotes(&self) -> &[PlayerState] {
        &self.remotes
    }

    pub fn remote(&self, id: &str) -> Option<&PlayerState> {
        self.remotes.iter().find(|player| player.id == id)
    }

    /// Players currently shown, including our own.
    pub fn player_count(&self) -> usize {
        self.remotes.len() + usize::from(self.local.is_some())
    }

    /// Adopts the identity the server assigned.
    ///
    /// A repeated handshake for the same id refreshes the local player in
    /// place. Any mirror already carrying that id is dropped, since it can
    /// only be ourselves seen through an earlier snapshot.
    pub fn apply_handshake<V: VisualSink>(&mut self, player: PlayerState, visuals: &mut V) {
        if let Some(index) = self.remotes.iter().position(|p| p.id == player.id) {
            self.remotes.swap_remove(index);
            visuals.destroy(&player.id);
        }

        match self.local.take() {
            Some(current) if current.id == player.id => {
                visuals.update(&player.id, player.position);
            }
            Some(current) => {
                visuals.destroy(&current.id);
                visuals.create(&player.id, player.color, player.position);
            }
            None => visuals.create(&player.id, player.color, player.position),
        }

        info!("Handshake received, playing as {}", player.id);
        self.local = Some(player);
    }

    /// Merges a snapshot into the mirror, skipping our own entry.
    ///
    /// Known players take the snapshot's position and keep their color.
    /// Unknown players are mirrored with the snapshot's color and position.
    pub fn apply_server_update<V: VisualSink>(
        &mut self,
        players: Snapshot,
        visuals: &mut V,
    ) -> SnapshotOutcome {
        let mut outcome = SnapshotOutcome::default();

        for incoming in players {
            if self.local_id() == Some(&incoming.id) {
                outcome.skipped_self += 1;
                continue;
            }

            match self.remotes.iter().position(|p| p.id == incoming.id) {
                Some(index) => {
                    let mirror = &mut self.remotes[index];
                    mirror.position = incoming.position;
                    visuals.update(&mirror.id, mirror.position);
                    outcome.updated += 1;
                }
                None => {
                    debug!("Mirroring new player {}", incoming.id);
                    visuals.create(&incoming.id, incoming.color, incoming.position);
                    self.remotes.push(incoming);
                    outcome.created += 1;
                }
            }
        }

        outcome
    }

    /// Drops the mirror for a disconnected peer. Returns false if there was
    /// none.
    pub fn apply_delete<V: VisualSink>(&mut self, player: &PlayerState, visuals: &mut V) -> bool {
        match self.remotes.iter().position(|p| p.id == player.id) {
            Some(index) => {
                self.remotes.swap_remove(index);
                visuals.destroy(&player.id);
                info!("Client {} disconnected from server", player.id);
                true
            }
            None => {
                debug!("Delete for unknown player {}", player.id);
                false
            }
        }
    }

    /// Moves our own player on the XY plane. Does nothing before the
    /// handshake.
    pub fn move_local<V: VisualSink>(&mut self, dx: f32, dy: f32, visuals: &mut V) -> bool {
        let Some(local) = self.local.as_mut() else {
            return false;
        };
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        local.position = local.position.translated(dx, dy, 0.0);
        visuals.update(&local.id, local.position);
        true
    }
}
