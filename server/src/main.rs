use clap::Parser;
use log::{error, info};
use server::config::{Args, ServerConfig};
use server::game::GameState;
use server::network::Server;
use server::spawner::RespawnScheduler;
use server::world::World;
use std::sync::Arc;

/// Main-method of the application.
/// Parses command-line arguments, builds the world, then runs the respawn task and the listener.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::try_from(Args::parse())?;

    // Build the shared world with its initial collectibles
    let mut state = GameState::new(config.world_width, config.world_height);
    state.populate(config.initial_collectibles);
    let world = Arc::new(World::new(state));

    info!(
        "Arena {}x{} with {} collectibles",
        config.world_width, config.world_height, config.initial_collectibles
    );

    let spawner_handle = RespawnScheduler::new(
        Arc::clone(&world),
        config.respawn_interval,
        config.collectible_floor,
    )
    .spawn();

    let server = Server::bind(&config, world).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                spawner_handle.abort();
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    spawner_handle.abort();
    Ok(())
}
