//! Command line arguments and the validated server configuration.

use crate::error::ServerError;
use clap::Parser;
use shared::{WORLD_HEIGHT, WORLD_WIDTH};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Collectible arena WebSocket server", long_about = None)]
pub struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Request path accepted for the WebSocket upgrade
    #[arg(long, default_value = "/ws")]
    pub path: String,

    /// Arena width
    #[arg(long, default_value_t = WORLD_WIDTH)]
    pub width: f64,

    /// Arena height
    #[arg(long, default_value_t = WORLD_HEIGHT)]
    pub height: f64,

    /// Collectibles spawned at startup
    #[arg(long, default_value = "5")]
    pub initial_collectibles: usize,

    /// Minimum collectible count the respawn scheduler maintains
    #[arg(long, default_value = "5")]
    pub collectible_floor: usize,

    /// Seconds between respawn scheduler ticks
    #[arg(long, default_value = "5")]
    pub respawn_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub ws_path: String,
    pub world_width: f64,
    pub world_height: f64,
    pub initial_collectibles: usize,
    pub collectible_floor: usize,
    pub respawn_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            ws_path: "/ws".to_string(),
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            initial_collectibles: 5,
            collectible_floor: 5,
            respawn_interval: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        for (name, value) in [("width", self.world_width), ("height", self.world_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ServerError::Config(format!(
                    "arena {} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.respawn_interval.is_zero() {
            return Err(ServerError::Config(
                "respawn interval must be at least one second".to_string(),
            ));
        }
        if !self.ws_path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "websocket path must start with '/', got {:?}",
                self.ws_path
            )));
        }
        Ok(())
    }
}

impl TryFrom<Args> for ServerConfig {
    type Error = ServerError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = ServerConfig {
            bind_address: format!("{}:{}", args.host, args.port),
            ws_path: args.path,
            world_width: args.width,
            world_height: args.height,
            initial_collectibles: args.initial_collectibles,
            collectible_floor: args.collectible_floor,
            respawn_interval: Duration::from_secs(args.respawn_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
