//! Game Simulation Module
//!
//! Everything the simulation task mutates lives here, and nothing here
//! touches the network.
//!
//! ## Module Structure
//!
//! - `input`: pending input state, one per player
//! - `physics`: the shared physics world (gravity, ground, player bodies)
//! - `player`: player body handles and the input-to-motion rule
//! - `registry`: connection id -> player body lifecycle
//! - `tick`: the fixed-step simulation tick

pub mod input;
pub mod physics;
pub mod player;
pub mod registry;
pub mod tick;

// Re-export key types
pub use input::InputState;
pub use physics::PhysicsWorld;
pub use player::PlayerBody;
pub use registry::{ConnectionId, ConnectionRegistry};
pub use tick::{PlayerTransform, TickResult};
