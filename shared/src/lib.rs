use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;
pub const PLAYER_RADIUS: f64 = 20.0;
pub const COLLECTIBLE_RADIUS: f64 = 10.0;
pub const COLLECTIBLE_POINTS: u32 = 10;
pub const COLLECTIBLE_COLOR: &str = "#FFD700";
pub const PLAYER_COLORS: [&str; 5] = ["#1E90FF", "#FF69B4", "#32CD32", "#FFD700", "#FF4500"];

/// Last movement intent of a player. Display only, never used for simulation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub score: u32,
    pub radius: f64,
    pub color: String,
    pub velocity: Velocity,
}

impl Player {
    pub fn new(id: impl Into<String>, x: f64, y: f64, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            score: 0,
            radius: PLAYER_RADIUS,
            color: color.into(),
            velocity: Velocity::default(),
        }
    }

    pub fn distance_to(&self, collectible: &Collectible) -> f64 {
        let dx = collectible.x - self.x;
        let dy = collectible.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the two circles overlap. Touching edges do not count.
    pub fn overlaps(&self, collectible: &Collectible) -> bool {
        self.distance_to(collectible) < self.radius + collectible.radius
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Collectible {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
    pub points: u32,
}

impl Collectible {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            radius: COLLECTIBLE_RADIUS,
            color: COLLECTIBLE_COLOR.to_string(),
            points: COLLECTIBLE_POINTS,
        }
    }
}

/// Full copy of the world as pushed to a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub players: HashMap<String, Player>,
    pub collectibles: HashMap<String, Collectible>,
    pub world_width: f64,
    pub world_height: f64,
}

/// Server to client envelope.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "gameState")]
    GameState(GameSnapshot),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed envelope: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

/// Client intent decoded from an inbound envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Missing or non-numeric deltas are `None` and mean no movement on that axis.
    Move { dx: Option<f64>, dy: Option<f64> },
    /// Any other message type. Carries the type string for logging.
    Unknown(String),
}

impl Intent {
    /// Decodes `{"type": ..., "payload": ...}`.
    ///
    /// Only the envelope itself can fail: text that is not JSON, or a `type`
    /// that is neither a string nor null. Everything inside the payload is tolerated.
    pub fn decode(text: &str) -> Result<Intent, DecodeError> {
        let envelope: RawEnvelope = serde_json::from_str(text)?;

        let kind = envelope.kind.unwrap_or_default();
        Ok(match kind.as_str() {
            "move" => Intent::Move {
                dx: number_field(&envelope.payload, "dx"),
                dy: number_field(&envelope.payload, "dy"),
            },
            _ => Intent::Unknown(kind),
        })
    }

    pub fn move_by(dx: f64, dy: f64) -> String {
        serde_json::json!({ "type": "move", "payload": { "dx": dx, "dy": dy } }).to_string()
    }
}

fn number_field(payload: &Value, key: &str) -> Option<f64> {
    payload.get(key).and_then(Value::as_f64)
}
