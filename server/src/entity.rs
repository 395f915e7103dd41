//! Constructors for the two kinds of world entities.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Collectible, Player, PLAYER_COLORS};

pub fn player_id(seq: u64) -> String {
    format!("player_{}", seq)
}

pub fn collectible_id(seq: u64) -> String {
    format!("collectible_{}", seq)
}

/// Creates a player at a random position with a random palette color.
pub fn new_player<R: Rng + ?Sized>(id: String, width: f64, height: f64, rng: &mut R) -> Player {
    let (x, y) = random_position(width, height, rng);
    let color = PLAYER_COLORS.choose(rng).copied().unwrap_or(PLAYER_COLORS[0]);
    Player::new(id, x, y, color)
}

/// Creates the collectible minted by sequence number `seq`.
pub fn new_collectible<R: Rng + ?Sized>(
    seq: u64,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Collectible {
    let (x, y) = random_position(width, height, rng);
    Collectible::new(collectible_id(seq), x, y)
}

fn random_position<R: Rng + ?Sized>(width: f64, height: f64, rng: &mut R) -> (f64, f64) {
    (rng.gen::<f64>() * width, rng.gen::<f64>() * height)
}
