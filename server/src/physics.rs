//! Movement validation, pickup detection and collectible spawning.
//!
//! Everything here takes `&mut GameState`, so callers must already hold the
//! world's exclusive accessor. Nothing in this module locks.

use crate::entity;
use crate::game::GameState;
use log::debug;
use shared::Velocity;

/// One collectible consumed by a player during [`GameState::resolve_collisions`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub collected: String,
    pub replacement: String,
    pub points: u32,
}

/// Adds `delta` to `position` only when the result stays inside `[0, bound]`.
fn step_axis(position: f64, delta: Option<f64>, bound: f64) -> f64 {
    match delta {
        Some(d) => {
            let next = position + d;
            if (0.0..=bound).contains(&next) {
                next
            } else {
                position
            }
        }
        None => position,
    }
}

impl GameState {
    /// Moves a player by a delta, axis by axis.
    ///
    /// An axis whose result would leave the arena is dropped entirely rather
    /// than clamped; the other axis still moves. Returns `false` when the
    /// player is gone, which is expected when a move races a disconnect.
    pub fn apply_move(&mut self, player_id: &str, dx: Option<f64>, dy: Option<f64>) -> bool {
        let (width, height) = (self.width(), self.height());
        let Some(player) = self.players.get_mut(player_id) else {
            return false;
        };

        player.x = step_axis(player.x, dx, width);
        player.y = step_axis(player.y, dy, height);
        player.velocity = Velocity {
            x: dx.unwrap_or(0.0),
            y: dy.unwrap_or(0.0),
        };
        true
    }

    /// Awards every collectible the player currently overlaps.
    ///
    /// Hits are gathered before anything is removed so each collectible present
    /// at call time is examined exactly once. Each pickup spawns exactly one
    /// replacement, keeping the collectible count unchanged.
    pub fn resolve_collisions(&mut self, player_id: &str) -> Vec<Pickup> {
        let Some(player) = self.players.get(player_id) else {
            return Vec::new();
        };

        let hits: Vec<String> = self
            .collectibles
            .values()
            .filter(|collectible| player.overlaps(collectible))
            .map(|collectible| collectible.id.clone())
            .collect();

        let mut pickups = Vec::with_capacity(hits.len());
        for collected in hits {
            let Some(collectible) = self.collectibles.remove(&collected) else {
                continue;
            };
            if let Some(player) = self.players.get_mut(player_id) {
                player.score += collectible.points;
            }
            let replacement = self.spawn_collectible();

            debug!(
                "{} picked up {} (+{}), replaced by {}",
                player_id, collected, collectible.points, replacement
            );
            pickups.push(Pickup {
                collected,
                replacement,
                points: collectible.points,
            });
        }
        pickups
    }

    /// Mints the next collectible id, places it at random and returns the id.
    pub fn spawn_collectible(&mut self) -> String {
        let seq = self.mint_collectible_seq();
        let collectible =
            entity::new_collectible(seq, self.width(), self.height(), &mut rand::thread_rng());
        let id = collectible.id.clone();
        self.collectibles.insert(id.clone(), collectible);
        id
    }

    /// Spawns the initial collectible population.
    pub fn populate(&mut self, count: usize) {
        for _ in 0..count {
            self.spawn_collectible();
        }
    }
}
