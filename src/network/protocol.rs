//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. All
//! messages are JSON text frames tagged with a `type` field.
//!
//! Three messages carry the whole protocol: clients submit `input`,
//! the server broadcasts `movement` once per live player per tick and
//! `destroy` once when a body is removed.

use serde::{Deserialize, Serialize};

use crate::game::input::InputState;
use crate::game::registry::ConnectionId;
use crate::game::tick::PlayerTransform;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the pending input for the sender's body.
    Input(InputState),
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One player's transform for this tick. Broadcast to every client.
    Movement(MovementUpdate),

    /// A connection's body was removed. Broadcast once to every remaining
    /// client.
    Destroy {
        /// The removed connection.
        id: ConnectionId,
    },

    /// A malformed inbound frame was rejected.
    Error(ServerError),
}

/// Transform update for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementUpdate {
    /// Owning connection.
    pub id: ConnectionId,
    /// Authoritative body state after the tick.
    pub body: BodyState,
}

/// Position and orientation of one body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyState {
    /// World-space position.
    pub position: Position,
    /// World-space orientation (unit quaternion).
    pub quaternion: Quaternion,
}

/// World-space position payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

/// Unit quaternion payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// X (i) component.
    pub x: f32,
    /// Y (j) component.
    pub y: f32,
    /// Z (k) component.
    pub z: f32,
    /// W (scalar) component.
    pub w: f32,
}

/// Server error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Human-readable message.
    pub message: String,
}

impl From<&PlayerTransform> for ServerMessage {
    fn from(transform: &PlayerTransform) -> Self {
        ServerMessage::Movement(MovementUpdate {
            id: transform.id,
            body: BodyState {
                position: Position {
                    x: transform.position.x,
                    y: transform.position.y,
                    z: transform.position.z,
                },
                quaternion: Quaternion {
                    x: transform.rotation.i,
                    y: transform.rotation.j,
                    z: transform.rotation.k,
                    w: transform.rotation.w,
                },
            },
        })
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
