//! Background task keeping a minimum number of collectibles in the arena.

use crate::game::GameState;
use crate::world::World;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Spawns a single collectible when fewer than `floor` are present.
///
/// Never spawns more than one per call, so a depleted arena refills one
/// collectible per tick.
pub fn top_up(state: &mut GameState, floor: usize) -> Option<String> {
    if state.collectibles.len() < floor {
        Some(state.spawn_collectible())
    } else {
        None
    }
}

pub struct RespawnScheduler {
    world: Arc<World>,
    period: Duration,
    floor: usize,
}

impl RespawnScheduler {
    pub fn new(world: Arc<World>, period: Duration, floor: usize) -> Self {
        Self {
            world,
            period,
            floor,
        }
    }

    /// Runs one scheduler tick against the world.
    pub async fn tick(&self) -> Option<String> {
        let floor = self.floor;
        self.world.with_write(|state| top_up(state, floor)).await
    }

    /// Ticks forever. The first tick happens one full period after start.
    pub async fn run(self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        timer.tick().await;

        info!(
            "Respawn scheduler started (every {:?}, floor {})",
            self.period, self.floor
        );

        loop {
            timer.tick().await;
            if let Some(id) = self.tick().await {
                debug!("Respawned {}", id);
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
