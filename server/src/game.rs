use crate::entity;
use log::info;
use shared::{Collectible, GameSnapshot, Player};
use std::collections::HashMap;

/// The arena: bounds, every player and every collectible.
///
/// Mutation happens through `&mut GameState`, which outside of tests is only
/// reachable from inside [`crate::world::World::with_write`].
#[derive(Debug, Clone)]
pub struct GameState {
    width: f64,
    height: f64,
    pub players: HashMap<String, Player>,
    pub collectibles: HashMap<String, Collectible>,
    next_collectible_seq: u64,
    next_player_seq: u64,
}

impl GameState {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            players: HashMap::new(),
            collectibles: HashMap::new(),
            next_collectible_seq: 0,
            next_player_seq: 0,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of collectible ids minted so far.
    pub fn collectibles_minted(&self) -> u64 {
        self.next_collectible_seq
    }

    pub(crate) fn mint_collectible_seq(&mut self) -> u64 {
        self.next_collectible_seq += 1;
        self.next_collectible_seq
    }

    /// Mints a fresh player id, places a new player and returns the id.
    pub fn add_player(&mut self) -> String {
        self.next_player_seq += 1;
        let id = entity::player_id(self.next_player_seq);
        let player =
            entity::new_player(id.clone(), self.width, self.height, &mut rand::thread_rng());

        info!(
            "Added player {} at ({:.1}, {:.1})",
            player.id, player.x, player.y
        );
        self.players.insert(id.clone(), player);
        id
    }

    /// Inserts an already built player, replacing any player with the same id.
    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    pub fn remove_player(&mut self, id: &str) -> bool {
        match self.players.remove(id) {
            Some(player) => {
                info!("Removed player {} (score {})", id, player.score);
                true
            }
            None => false,
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
            collectibles: self.collectibles.clone(),
            world_width: self.width,
            world_height: self.height,
        }
    }
}
