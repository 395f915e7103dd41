//! Headless bot that joins the arena and chases the nearest collectible.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use rand::Rng;
use shared::{GameSnapshot, Intent, ServerMessage};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about = "Arena test client", long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Number of moves to send before disconnecting
    #[arg(short, long, default_value = "50")]
    moves: u32,

    /// Largest distance covered by one move on each axis
    #[arg(short, long, default_value = "15")]
    step: f64,

    /// Delay between moves in milliseconds
    #[arg(short, long, default_value = "100")]
    delay_ms: u64,
}

/// Picks a move toward the closest collectible, or a random one if none exist.
fn next_move(snapshot: &GameSnapshot, me: &str, step: f64, rng: &mut impl Rng) -> (f64, f64) {
    let Some(player) = snapshot.players.get(me) else {
        return (0.0, 0.0);
    };

    let target = snapshot.collectibles.values().min_by(|a, b| {
        player
            .distance_to(a)
            .partial_cmp(&player.distance_to(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match target {
        Some(c) => (
            (c.x - player.x).clamp(-step, step),
            (c.y - player.y).clamp(-step, step),
        ),
        None => (rng.gen_range(-step..=step), rng.gen_range(-step..=step)),
    }
}

fn parse_snapshot(message: Message) -> Option<GameSnapshot> {
    let text = message.into_text().ok()?;
    match serde_json::from_str::<ServerMessage>(text.as_str()) {
        Ok(ServerMessage::GameState(snapshot)) => Some(snapshot),
        Err(e) => {
            warn!("Unreadable server message: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Connecting to {}", args.url);
    let (mut ws, _) = connect_async(args.url.as_str()).await?;

    let mut snapshot = match ws.next().await {
        Some(message) => parse_snapshot(message?).ok_or("expected an initial game state")?,
        None => return Err("server closed before sending a game state".into()),
    };

    // Player ids grow monotonically, so the newest player in the first snapshot is us.
    let me = snapshot
        .players
        .keys()
        .max_by_key(|id| {
            id.trim_start_matches("player_")
                .parse::<u64>()
                .unwrap_or(0)
        })
        .cloned()
        .ok_or("initial game state had no players")?;
    info!(
        "Joined as {} ({} players, {} collectibles)",
        me,
        snapshot.players.len(),
        snapshot.collectibles.len()
    );

    let mut rng = rand::thread_rng();
    for _ in 0..args.moves {
        let (dx, dy) = next_move(&snapshot, &me, args.step, &mut rng);
        ws.send(Message::text(Intent::move_by(dx, dy))).await?;

        match ws.next().await {
            Some(message) => {
                if let Some(next) = parse_snapshot(message?) {
                    snapshot = next;
                }
            }
            None => {
                warn!("Server closed the connection");
                break;
            }
        }

        if let Some(player) = snapshot.players.get(&me) {
            info!(
                "{} at ({:.1}, {:.1}) score {}",
                me, player.x, player.y, player.score
            );
        }
        sleep(Duration::from_millis(args.delay_ms)).await;
    }

    ws.close(None).await?;
    info!("Test client finished");
    Ok(())
}
