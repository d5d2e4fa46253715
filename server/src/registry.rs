//! Authoritative registry of connected players.
//!
//! The registry owns every `PlayerState` the server knows about. It hands
//! out identities from a counter that never resets, picks a color and a
//! spawn point for each newcomer, applies self-reported positions, and
//! produces the snapshots the broadcaster sends out.
//!
//! Entries live in an ordered `Vec`. Removal is swap-and-truncate, so it is
//! O(1) but reorders the entries; nothing outside this module should hold
//! on to an index across a removal. The server addresses players by id.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{spawn_position, PlayerId, PlayerState, Rgb, Snapshot, Vec3, COLOR_STEPS};

pub struct SessionRegistry {
    /// Known players, in join order until the first removal
    clients: Vec<PlayerState>,
    /// Next identity to hand out
    next_id: u64,
    rng: StdRng,
}

impl SessionRegistry {
    /// Creates an empty registry with an entropy-seeded color source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty registry whose colors are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            clients: Vec::new(),
            next_id: 0,
            rng,
        }
    }

    /// Registers a new player and returns a copy of its state.
    ///
    /// The id is the counter's current value as text. Each color channel is
    /// one of `COLOR_STEPS` evenly spaced values in `[0, 1)`. The spawn point
    /// depends only on how many players are registered right now, so two
    /// players can share a spawn point after a removal.
    pub fn allocate(&mut self) -> PlayerState {
        let id = self.next_id.to_string();
        self.next_id += 1;

        let color = Rgb::from_steps(
            self.rng.gen_range(0..COLOR_STEPS),
            self.rng.gen_range(0..COLOR_STEPS),
            self.rng.gen_range(0..COLOR_STEPS),
        );
        let position = spawn_position(self.clients.len());

        let player = PlayerState::new(id, color, position);
        info!(
            "Added player {} at ({}, {}, {})",
            player.id, position.x, position.y, position.z
        );
        self.clients.push(player.clone());
        player
    }

    /// Overwrites the position of the player with `id`.
    ///
    /// Returns false without touching anything when no such player exists,
    /// which happens when an update races the player's removal.
    pub fn apply_update(&mut self, id: &str, position: Vec3) -> bool {
        match self.clients.iter_mut().find(|player| player.id == id) {
            Some(player) => {
                player.position = position;
                true
            }
            None => {
                debug!("Ignoring update for unknown player {}", id);
                false
            }
        }
    }

    /// Removes the entry at `index` by swapping in the last entry.
    pub fn remove(&mut self, index: usize) -> Option<PlayerState> {
        if index >= self.clients.len() {
            return None;
        }
        let removed = self.clients.swap_remove(index);
        info!("Removed player {}", removed.id);
        Some(removed)
    }

    /// Removes the player with `id`, if present.
    pub fn remove_by_id(&mut self, id: &str) -> Option<PlayerState> {
        let index = self.index_of(id)?;
        self.remove(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.clients.iter().position(|player| player.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&PlayerState> {
        self.clients.iter().find(|player| player.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Copies out every entry. The copy is independent of the registry.
    pub fn snapshot(&self) -> Snapshot {
        self.clients.clone()
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.clients
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.clients.iter().map(|player| player.id.clone()).collect()
    }

    /// Returns the number of registered players
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::COLOR_UNIT;
    use std::collections::HashSet;

    #[test]
    fn test_registry_creation() {
        let registry = SessionRegistry::with_seed(1);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_ids_count_up_from_zero() {
        let mut registry = SessionRegistry::with_seed(1);

        assert_eq!(registry.allocate().id, "0");
        assert_eq!(registry.allocate().id, "1");
        assert_eq!(registry.allocate().id, "2");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut registry = SessionRegistry::with_seed(1);
        registry.allocate();
        registry.allocate();

        registry.remove_by_id("1").unwrap();
        assert_eq!(registry.allocate().id, "2");
    }

    #[test]
    fn test_ids_unique_across_churn() {
        let mut registry = SessionRegistry::with_seed(7);
        for round in 0..50 {
            registry.allocate();
            registry.allocate();
            if round % 3 == 0 {
                registry.remove(0);
            }

            let ids: HashSet<_> = registry.ids().into_iter().collect();
            assert_eq!(ids.len(), registry.len());
        }
    }

    #[test]
    fn test_spawn_positions_follow_registry_size() {
        let mut registry = SessionRegistry::with_seed(1);

        let a = registry.allocate();
        let b = registry.allocate();
        assert_eq!(a.position, Vec3::splat(-0.25));
        assert_eq!(b.position, Vec3::splat(0.0));

        registry.remove_by_id("0");
        let c = registry.allocate();
        assert_eq!(c.position, b.position);
    }

    #[test]
    fn test_colors_are_quantized() {
        let mut registry = SessionRegistry::with_seed(42);

        for _ in 0..20 {
            let color = registry.allocate().color;
            for channel in [color.r, color.g, color.b] {
                assert!((0.0..1.0).contains(&channel));
                let steps = channel / COLOR_UNIT;
                assert_approx_eq!(steps, steps.round(), 1e-2);
            }
        }
    }

    #[test]
    fn test_seeded_colors_repeat() {
        let mut a = SessionRegistry::with_seed(9);
        let mut b = SessionRegistry::with_seed(9);
        assert_eq!(a.allocate().color, b.allocate().color);
    }

    #[test]
    fn test_apply_update() {
        let mut registry = SessionRegistry::with_seed(1);
        registry.allocate();
        registry.allocate();

        assert!(registry.apply_update("1", Vec3::splat(5.0)));
        assert_eq!(registry.get("1").unwrap().position, Vec3::splat(5.0));
        assert_eq!(registry.get("0").unwrap().position, Vec3::splat(-0.25));
    }

    #[test]
    fn test_apply_update_unknown_player() {
        let mut registry = SessionRegistry::with_seed(1);
        registry.allocate();
        let before = registry.snapshot();

        assert!(!registry.apply_update("99", Vec3::splat(1.0)));
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn test_remove_swaps_last_into_place() {
        let mut registry = SessionRegistry::with_seed(1);
        for _ in 0..4 {
            registry.allocate();
        }

        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.id, "1");
        assert_eq!(registry.ids(), vec!["0", "3", "2"]);
        assert_eq!(registry.index_of("3"), Some(1));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut registry = SessionRegistry::with_seed(1);
        registry.allocate();

        assert!(registry.remove(5).is_none());
        assert!(registry.remove_by_id("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_keeps_other_ids() {
        let mut registry = SessionRegistry::with_seed(1);
        for _ in 0..5 {
            registry.allocate();
        }

        registry.remove_by_id("2");
        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, vec!["0", "1", "3", "4"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut registry = SessionRegistry::with_seed(1);
        registry.allocate();

        let mut snapshot = registry.snapshot();
        snapshot[0].position = Vec3::splat(100.0);
        snapshot.clear();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("0").unwrap().position, Vec3::splat(-0.25));
    }
}
