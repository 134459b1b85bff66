//! # Arena Game Server
//!
//! Authoritative multiplayer simulation server. Each connected client owns
//! one rigid body in a shared physics world; the server applies
//! client-submitted inputs, advances the world at a fixed rate, and
//! broadcasts the resulting transforms to every client.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ARENA SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Simulation (network-free)                 │
//! │  ├── input.rs    - Pending input state per player            │
//! │  ├── physics.rs  - Physics world (gravity, ground, bodies)   │
//! │  ├── player.rs   - Player bodies and the motion rule         │
//! │  ├── registry.rs - Connection id -> player body mapping      │
//! │  └── tick.rs     - Fixed-step simulation tick                │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket server + simulation task        │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! A single simulation task owns the physics world and the connection
//! registry. Connection tasks never touch either directly: connects,
//! inputs, and disconnects travel through one mpsc queue and are applied
//! between ticks. Outbound broadcast is fire-and-forget through bounded
//! per-client channels, so a stalled client can never hold up the tick.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::input::InputState;
pub use game::physics::PhysicsWorld;
pub use game::registry::{ConnectionId, ConnectionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz). Broadcast cadence and physics step are
/// coupled: one tick is one physics step and one transform broadcast.
pub const TICK_RATE: u32 = 30;
