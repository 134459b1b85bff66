//! Player Bodies and the Motion Rule
//!
//! A `PlayerBody` is a thin handle: the connection id, the rigid body in
//! the physics world, and the pending input buffer. The physics world owns
//! the authoritative position and orientation.
//!
//! Motion is kinematic, not dynamic: the forward key nudges the position
//! directly and the turn keys rewrite the orientation. The tick applies
//! this rule first and runs the dynamics step afterwards, so gravity and
//! ground contact resolve against the already-nudged position.

use rapier3d::prelude::*;

use crate::game::input::InputState;
use crate::game::physics::PhysicsWorld;
use crate::game::registry::ConnectionId;

/// Forward displacement per tick while the forward key is held.
pub const FORWARD_STEP: Real = 0.7;

/// Yaw rotation per tick (radians) while exactly one turn key is held.
pub const YAW_STEP: Real = 0.05;

/// Spawn point for new player bodies.
pub fn spawn_position() -> Vector<Real> {
    vector![0.0, 20.0, 0.0]
}

/// One connected player's body handle plus its pending input.
pub struct PlayerBody {
    id: ConnectionId,
    handle: RigidBodyHandle,
    pending: InputState,
}

impl PlayerBody {
    /// Create the rigid body at the spawn point and wrap it.
    pub fn spawn(id: ConnectionId, world: &mut PhysicsWorld) -> Self {
        let handle = world.add_player_body(spawn_position());
        Self {
            id,
            handle,
            pending: InputState::new(),
        }
    }

    /// Connection id owning this body.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Rigid body handle in the physics world.
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    /// Currently pending input.
    pub fn pending(&self) -> InputState {
        self.pending
    }

    /// Replace the pending input wholesale (last write wins).
    pub fn set_pending(&mut self, input: InputState) {
        self.pending = input;
    }

    /// Apply the motion rule for one tick, before the dynamics step.
    ///
    /// Forward: rotate the local +Z axis into world space by the current
    /// orientation, scale by [`FORWARD_STEP`], add to the position.
    /// Turning: compose a ±[`YAW_STEP`] rotation about +Y into the
    /// orientation (left and right cancel when held together).
    pub fn apply_pending(&self, world: &mut PhysicsWorld) {
        if self.pending.forward {
            if let Some(rotation) = world.rotation(self.handle) {
                let delta = rotation * vector![0.0, 0.0, FORWARD_STEP];
                world.apply_translation(self.handle, delta);
            }
        }

        let sign = self.pending.yaw_sign();
        if sign != 0 {
            world.apply_yaw(self.handle, YAW_STEP * Real::from(sign));
        }
    }
}
