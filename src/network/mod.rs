//! Network Layer
//!
//! WebSocket transport for the simulation. This layer is
//! **non-deterministic** - all body mutation runs through `game/`, fed by
//! the simulation task's event queue.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, MovementUpdate, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
