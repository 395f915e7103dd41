//! Per-connection control loop.
//!
//! A session registers one player when it becomes active, answers every
//! processed inbound message with a full snapshot, and removes the player when
//! the connection ends for any reason.

use crate::error::SessionError;
use crate::world::World;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use shared::{Intent, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::{self, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

pub struct Session {
    world: Arc<World>,
    player_id: Option<String>,
    state: SessionState,
}

impl Session {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            player_id: None,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    /// Registers this session's player in the world and returns its id.
    pub async fn activate(&mut self) -> String {
        if let Some(id) = &self.player_id {
            return id.clone();
        }
        let id = self.world.join().await;
        self.player_id = Some(id.clone());
        self.state = SessionState::Active;
        id
    }

    pub async fn snapshot(&self) -> ServerMessage {
        ServerMessage::GameState(self.world.snapshot().await)
    }

    /// Processes one inbound text message.
    ///
    /// Returns the snapshot to push back, or `None` when the message was
    /// dropped (undecodable envelope, or the session is not active).
    pub async fn handle_text(&self, text: &str) -> Option<ServerMessage> {
        let player_id = match (&self.player_id, self.state) {
            (Some(id), SessionState::Active) => id,
            _ => return None,
        };

        let intent = match Intent::decode(text) {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Dropping message from {}: {}", player_id, e);
                return None;
            }
        };

        match intent {
            Intent::Move { dx, dy } => {
                self.world.apply_move(player_id, dx, dy).await;
                self.world.resolve_collisions(player_id).await;
            }
            Intent::Unknown(kind) => {
                debug!("Ignoring message type {:?} from {}", kind, player_id);
            }
        }

        Some(self.snapshot().await)
    }

    /// Removes the player from the world. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(id) = &self.player_id {
            self.world.leave(id).await;
        }
        self.state = SessionState::Closed;
    }
}

async fn send<S>(ws: &mut S, message: &ServerMessage) -> Result<(), SessionError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    ws.send(Message::text(message.to_json()?)).await?;
    Ok(())
}

async fn drive<S>(session: &Session, ws: &mut S) -> Result<(), SessionError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    send(ws, &session.snapshot().await).await?;

    while let Some(frame) = ws.next().await {
        let reply = match frame {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()).await,
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => session.handle_text(text).await,
                Err(_) => {
                    warn!("Dropping non UTF-8 binary frame");
                    None
                }
            },
            // The next poll sends the close reply and then ends the stream.
            Ok(Message::Close(_)) => None,
            Ok(_) => None,
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                break
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(message) = reply {
            send(ws, &message).await?;
        }
    }
    Ok(())
}

/// Runs a session over an already upgraded connection until it closes.
///
/// The player is removed from the world on every exit path, including
/// transport errors while reading or sending.
pub async fn run_session<S>(
    world: Arc<World>,
    mut ws: S,
    peer: SocketAddr,
) -> Result<(), SessionError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    let mut session = Session::new(world);
    let player_id = session.activate().await;
    info!("Player {} connected from {}", player_id, peer);

    let result = drive(&session, &mut ws).await;
    session.close().await;

    match &result {
        Ok(()) => info!("Player {} disconnected", player_id),
        Err(e) => warn!("Player {} dropped: {}", player_id, e),
    }
    result
}
