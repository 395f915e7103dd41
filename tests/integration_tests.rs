//! Integration tests for the arena server
//!
//! These tests run the real listener on an ephemeral port and talk to it over
//! WebSocket, the way a browser client would.

use futures_util::{SinkExt, StreamExt};
use server::config::ServerConfig;
use server::game::GameState;
use server::network::Server;
use server::spawner::RespawnScheduler;
use server::world::World;
use shared::{GameSnapshot, Intent, ServerMessage};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// Tests that a new connection gets a snapshot containing itself
    #[tokio::test]
    async fn initial_snapshot_on_connect() {
        let (addr, _world) = start_server(5).await;
        let mut client = connect(addr).await;

        let snapshot = next_snapshot(&mut client).await;
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.collectibles.len(), 5);
        assert_eq!(snapshot.world_width, 800.0);
        assert_eq!(snapshot.world_height, 600.0);

        let player = snapshot.players.values().next().unwrap();
        assert_eq!(player.score, 0);
        assert_eq!(player.radius, shared::PLAYER_RADIUS);
    }

    /// Tests that upgrade requests on another path are refused
    #[tokio::test]
    async fn wrong_path_is_rejected() {
        let (addr, world) = start_server(0).await;

        let result = connect_async(format!("ws://{}/not-the-game", addr)).await;
        match result {
            Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 404),
            Err(other) => panic!("Expected an HTTP rejection, got {}", other),
            Ok(_) => panic!("Handshake on the wrong path should fail"),
        }
        assert!(world.with_read(|state| state.players.is_empty()).await);
    }

    /// Tests that closing a connection removes its player
    #[tokio::test]
    async fn disconnect_removes_player() {
        let (addr, world) = start_server(0).await;
        let mut client = connect(addr).await;
        let id = own_id(&next_snapshot(&mut client).await);

        assert_ok!(client.close(None).await);

        wait_until(|| {
            let world = Arc::clone(&world);
            let id = id.clone();
            async move { !world.with_read(|state| state.players.contains_key(&id)).await }
        })
        .await;
    }

    /// Tests that the server answers a client's close frame
    #[tokio::test]
    async fn close_handshake_completes() {
        let (addr, _world) = start_server(0).await;
        let mut client = connect(addr).await;
        next_snapshot(&mut client).await;

        assert_ok!(client.send(Message::Close(None)).await);
        let reply = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for the close reply");
        match reply {
            Some(Ok(Message::Close(_))) | None => {}
            other => panic!("Expected the close reply, got {:?}", other),
        }
    }

    /// Tests that a dropped TCP connection without a close frame also cleans up
    #[tokio::test]
    async fn abrupt_disconnect_removes_player() {
        let (addr, world) = start_server(0).await;
        let mut client = connect(addr).await;
        let id = own_id(&next_snapshot(&mut client).await);

        drop(client);

        wait_until(|| {
            let world = Arc::clone(&world);
            let id = id.clone();
            async move { !world.with_read(|state| state.players.contains_key(&id)).await }
        })
        .await;
    }

    /// Tests that other players show up in each other's snapshots
    #[tokio::test]
    async fn players_see_each_other() {
        let (addr, _world) = start_server(0).await;

        let mut first = connect(addr).await;
        let first_id = own_id(&next_snapshot(&mut first).await);

        let mut second = connect(addr).await;
        let snapshot = next_snapshot(&mut second).await;
        assert_eq!(snapshot.players.len(), 2);
        assert!(snapshot.players.contains_key(&first_id));

        first
            .send(Message::text(Intent::move_by(0.0, 0.0)))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut first).await;
        assert_eq!(snapshot.players.len(), 2);
    }
}

/// GAMEPLAY TESTS
mod gameplay_tests {
    use super::*;

    /// Tests per-axis rejection end to end
    #[tokio::test]
    async fn move_is_validated_per_axis() {
        let (addr, world) = start_server(0).await;
        let mut client = connect(addr).await;
        let id = own_id(&next_snapshot(&mut client).await);

        world
            .with_write(|state| {
                let player = state.players.get_mut(&id).unwrap();
                player.x = 10.0;
                player.y = 10.0;
            })
            .await;

        client
            .send(Message::text(Intent::move_by(-50.0, 0.0)))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut client).await;
        assert_approx_eq::assert_approx_eq!(snapshot.players[&id].x, 10.0);

        client
            .send(Message::text(Intent::move_by(0.0, 50.0)))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut client).await;
        assert_approx_eq::assert_approx_eq!(snapshot.players[&id].y, 60.0);
        assert_eq!(snapshot.players[&id].velocity.y, 50.0);
    }

    /// Tests that a pickup is reflected in the very next reply
    #[tokio::test]
    async fn pickup_reflected_in_reply() {
        let (addr, world) = start_server(0).await;
        let mut client = connect(addr).await;
        let id = own_id(&next_snapshot(&mut client).await);

        world
            .with_write(|state| {
                let player = state.players.get_mut(&id).unwrap();
                player.x = 100.0;
                player.y = 100.0;
                state.collectibles.insert(
                    "bonus".to_string(),
                    shared::Collectible::new("bonus", 105.0, 100.0),
                );
            })
            .await;

        client
            .send(Message::text(Intent::move_by(0.0, 0.0)))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut client).await;

        assert_eq!(snapshot.players[&id].score, 10);
        assert!(!snapshot.collectibles.contains_key("bonus"));
        assert_eq!(snapshot.collectibles.len(), 1);
    }

    /// Tests malformed and unknown messages against the live loop
    #[tokio::test]
    async fn malformed_messages_do_not_end_session() {
        let (addr, _world) = start_server(0).await;
        let mut client = connect(addr).await;
        let id = own_id(&next_snapshot(&mut client).await);

        client.send(Message::text("{{{")).await.unwrap();
        client
            .send(Message::text(r#"{"type":"dance","payload":{}}"#))
            .await
            .unwrap();

        // Only the unknown type is answered; the garbage was dropped.
        let snapshot = next_snapshot(&mut client).await;
        assert!(snapshot.players.contains_key(&id));

        client
            .send(Message::text(r#"{"type":"move","payload":{"dx":"left"}}"#))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut client).await;
        assert!(snapshot.players.contains_key(&id));
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;

    /// Tests many clients moving at once against one world
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_clients_keep_world_consistent() {
        const CLIENTS: usize = 10;
        const MOVES: usize = 30;
        const INITIAL: usize = 25;

        let (addr, world) = start_server(INITIAL).await;

        let handles: Vec<_> = (0..CLIENTS)
            .map(|i| {
                tokio::spawn(async move {
                    let mut client = connect(addr).await;
                    next_snapshot(&mut client).await;

                    for step in 0..MOVES {
                        let d = if (i + step) % 2 == 0 { 40.0 } else { -40.0 };
                        client
                            .send(Message::text(Intent::move_by(d, -d)))
                            .await
                            .unwrap();
                        let snapshot = next_snapshot(&mut client).await;
                        for player in snapshot.players.values() {
                            assert!((0.0..=snapshot.world_width).contains(&player.x));
                            assert!((0.0..=snapshot.world_height).contains(&player.y));
                        }
                    }
                    client
                })
            })
            .collect();

        let mut clients = Vec::new();
        for handle in handles {
            clients.push(handle.await.unwrap());
        }

        world
            .with_read(|state| {
                assert_eq!(state.players.len(), CLIENTS);
                assert_eq!(state.collectibles.len(), INITIAL);

                let ids: HashSet<_> = state.collectibles.values().map(|c| &c.id).collect();
                assert_eq!(ids.len(), INITIAL);

                let pickups = state.collectibles_minted() - INITIAL as u64;
                let total: u64 = state.players.values().map(|p| p.score as u64).sum();
                assert_eq!(total, pickups * shared::COLLECTIBLE_POINTS as u64);
            })
            .await;

        for mut client in clients {
            assert_ok!(client.close(None).await);
        }
        wait_until(|| {
            let world = Arc::clone(&world);
            async move { world.with_read(|state| state.players.is_empty()).await }
        })
        .await;
    }

    /// Tests the respawn scheduler running alongside live sessions
    #[tokio::test]
    async fn scheduler_refills_while_clients_play() {
        let (addr, world) = start_server(0).await;
        let scheduler =
            RespawnScheduler::new(Arc::clone(&world), Duration::from_millis(20), 5).spawn();

        let mut client = connect(addr).await;
        next_snapshot(&mut client).await;

        wait_until(|| {
            let world = Arc::clone(&world);
            async move { world.with_read(|state| state.collectibles.len() == 5).await }
        })
        .await;

        client
            .send(Message::text(Intent::move_by(0.0, 0.0)))
            .await
            .unwrap();
        let snapshot = next_snapshot(&mut client).await;
        assert_eq!(snapshot.collectibles.len(), 5);

        scheduler.abort();
    }
}

// HELPER FUNCTIONS

async fn start_server(initial_collectibles: usize) -> (SocketAddr, Arc<World>) {
    let config = ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    };

    let mut state = GameState::new(config.world_width, config.world_height);
    state.populate(initial_collectibles);
    let world = Arc::new(World::new(state));

    let server = Server::bind(&config, Arc::clone(&world)).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    (addr, world)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = assert_ok!(connect_async(format!("ws://{}/ws", addr)).await);
    client
}

async fn next_snapshot(client: &mut Client) -> GameSnapshot {
    let frame = timeout(Duration::from_secs(5), client.next())
        .await
        .expect("Timed out waiting for a snapshot");

    match frame {
        Some(Ok(Message::Text(text))) => match serde_json::from_str(text.as_str()).unwrap() {
            ServerMessage::GameState(snapshot) => snapshot,
        },
        other => panic!("Expected a text frame, got {:?}", other),
    }
}

/// The newest player in a client's first snapshot is that client.
fn own_id(snapshot: &GameSnapshot) -> String {
    snapshot
        .players
        .keys()
        .max_by_key(|id| id.trim_start_matches("player_").parse::<u64>().unwrap())
        .cloned()
        .unwrap()
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition().await {
        assert!(Instant::now() < deadline, "Condition not met within 5s");
        sleep(Duration::from_millis(10)).await;
    }
}
