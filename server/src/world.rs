//! Shared access to the single [`GameState`] of the process.
//!
//! The store only hands out the state inside a synchronous closure. A guard
//! therefore can never live across an `.await`, so no task holds the lock
//! while waiting on the network, and the guard is dropped on every exit path
//! of the closure including unwinding.

use crate::game::GameState;
use crate::physics::Pickup;
use shared::GameSnapshot;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct World {
    state: RwLock<GameState>,
    width: f64,
    height: f64,
}

impl World {
    pub fn new(state: GameState) -> Self {
        Self {
            width: state.width(),
            height: state.height(),
            state: RwLock::new(state),
        }
    }

    /// Arena bounds. Fixed at construction, readable without locking.
    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Runs `f` under the shared lock. Many readers may run at once.
    pub async fn with_read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        let guard = self.state.read().await;
        f(&*guard)
    }

    /// Runs `f` under the exclusive lock. Writers never interleave.
    pub async fn with_write<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let mut guard = self.state.write().await;
        f(&mut *guard)
    }

    pub async fn join(&self) -> String {
        self.with_write(|state| state.add_player()).await
    }

    pub async fn leave(&self, player_id: &str) -> bool {
        self.with_write(|state| state.remove_player(player_id)).await
    }

    pub async fn apply_move(&self, player_id: &str, dx: Option<f64>, dy: Option<f64>) -> bool {
        self.with_write(|state| state.apply_move(player_id, dx, dy)).await
    }

    pub async fn resolve_collisions(&self, player_id: &str) -> Vec<Pickup> {
        self.with_write(|state| state.resolve_collisions(player_id)).await
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.with_read(GameState::snapshot).await
    }
}
