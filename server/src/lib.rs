//! # Arena Server Library
//!
//! This library provides the authoritative server for a shared 2D arena. Clients
//! connect over WebSocket, steer an avatar with relative moves, and collect
//! scoring items. After every processed message the acting client receives a
//! full snapshot of the arena.
//!
//! ## Core Responsibilities
//!
//! ### Shared World
//! One [`world::World`] holds every player and collectible. It is built once
//! at startup and handed to every task that needs it as an `Arc<World>`.
//! Access goes through two scoped accessors:
//! - `with_read` runs a closure under a shared lock
//! - `with_write` runs a closure under an exclusive lock
//!
//! The closures are synchronous, so a lock can never be held while a task
//! waits on the network.
//!
//! ### Movement and Pickups
//! Moves are relative deltas validated per axis. An axis whose result would
//! leave the arena is rejected while the other axis still applies. After each
//! move the player's circle is tested against every collectible; every overlap
//! awards points and spawns one replacement under a fresh id.
//!
//! ### Respawning
//! A background scheduler tops the arena up by one collectible per tick while
//! fewer than the configured floor are present.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The arena aggregate: bounds, player and collectible maps, id counters,
//! player join/leave and snapshot building.
//!
//! ### Entity Module (`entity`)
//! Random constructors for players and collectibles.
//!
//! ### Physics Module (`physics`)
//! Per-axis movement validation, pickup detection and collectible spawning.
//!
//! ### World Module (`world`)
//! The lock around the game state and the scoped accessors.
//!
//! ### Spawner Module (`spawner`)
//! The periodic respawn task.
//!
//! ### Session Module (`session`)
//! The per-connection state machine: register, answer, deregister.
//!
//! ### Network Module (`network`)
//! TCP listener, WebSocket handshake and per-connection task spawning.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::game::GameState;
//! use server::network::Server;
//! use server::spawner::RespawnScheduler;
//! use server::world::World;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!
//!     let mut state = GameState::new(config.world_width, config.world_height);
//!     state.populate(config.initial_collectibles);
//!     let world = Arc::new(World::new(state));
//!
//!     RespawnScheduler::new(
//!         Arc::clone(&world),
//!         config.respawn_interval,
//!         config.collectible_floor,
//!     )
//!     .spawn();
//!
//!     Server::bind(&config, world).await?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! Inbound: `{"type": "move", "payload": {"dx": 1.0, "dy": -2.0}}`. Any other
//! type is accepted and answered with a snapshot without changing the arena.
//!
//! Outbound: `{"type": "gameState", "payload": {...}}` carrying all players,
//! all collectibles and the arena size.

pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod network;
pub mod physics;
pub mod session;
pub mod spawner;
pub mod world;
