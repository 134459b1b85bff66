//! Physics World
//!
//! Wrapper around the rapier3d rigid-body pipeline. Owns gravity, the
//! static ground plane, and every player body. The simulation task is the
//! only caller: bodies are added and removed between steps, never during
//! one.
//!
//! Player bodies collide with the ground only. They carry a cylinder
//! collider with rotations locked, so contact torque cannot tip them over;
//! orientation changes only through [`apply_yaw`](PhysicsWorld::apply_yaw).

use rapier3d::prelude::*;

/// World gravity along Y (m/s²).
pub const GRAVITY_Y: Real = -9.82;

/// Player collider cylinder radius.
pub const PLAYER_RADIUS: Real = 2.0;

/// Player collider cylinder height.
pub const PLAYER_HEIGHT: Real = 5.0;

/// Player body mass.
pub const PLAYER_MASS: Real = 1.0;

/// Collision group of the static ground plane.
pub const GROUND_GROUP: Group = Group::GROUP_1;

/// Collision group of player bodies. Players filter to the ground group
/// only, so they never collide with each other.
pub const PLAYER_GROUP: Group = Group::GROUP_2;

/// The shared physics world.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    ground: RigidBodyHandle,
}

impl PhysicsWorld {
    /// Create a world containing only the ground plane.
    pub fn new() -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        // Static infinite plane, face up. Created once, never mutated.
        let ground = rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        let ground_collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(InteractionGroups::new(GROUND_GROUP, PLAYER_GROUP))
            .build();
        collider_set.insert_with_parent(ground_collider, ground, &mut rigid_body_set);

        Self {
            gravity: vector![0.0, GRAVITY_Y, 0.0],
            rigid_body_set,
            collider_set,
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            ground,
        }
    }

    /// Advance every body by `dt` seconds (gravity integration + collision
    /// response). Safe to call only from the simulation task.
    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Add a dynamic player body at `position` with identity orientation.
    pub fn add_player_body(&mut self, position: Vector<Real>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cylinder(PLAYER_HEIGHT / 2.0, PLAYER_RADIUS)
            .mass(PLAYER_MASS)
            .collision_groups(InteractionGroups::new(PLAYER_GROUP, GROUND_GROUP))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        handle
    }

    /// Remove a body and its colliders from the world.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Current position of a body.
    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|b| *b.translation())
    }

    /// Current orientation of a body.
    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Rotation<Real>> {
        self.rigid_body_set.get(handle).map(|b| *b.rotation())
    }

    /// Current position and orientation of a body.
    pub fn transform(&self, handle: RigidBodyHandle) -> Option<(Vector<Real>, Rotation<Real>)> {
        self.rigid_body_set
            .get(handle)
            .map(|b| (*b.translation(), *b.rotation()))
    }

    /// Nudge a body by `delta`, bypassing force integration (kinematic
    /// translation). Wakes the body so the next step resolves contacts
    /// against the new position.
    pub fn apply_translation(&mut self, handle: RigidBodyHandle, delta: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let next = *body.translation() + delta;
            body.set_translation(next, true);
        }
    }

    /// Compose a yaw rotation of `angle` radians about +Y into a body's
    /// orientation and renormalize.
    pub fn apply_yaw(&mut self, handle: RigidBodyHandle, angle: Real) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let mut next = *body.rotation() * Rotation::from_axis_angle(&Vector::y_axis(), angle);
            next.renormalize();
            body.set_rotation(next, true);
        }
    }

    /// Reset a body whose position went non-finite (numerical blow-up) back
    /// to `spawn` at rest. Returns `true` if a reset happened.
    pub fn respawn_if_invalid(&mut self, handle: RigidBodyHandle, spawn: Vector<Real>) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        let p = body.translation();
        if p.x.is_finite() && p.y.is_finite() && p.z.is_finite() {
            return false;
        }
        body.set_translation(spawn, true);
        body.set_linvel(vector![0.0, 0.0, 0.0], true);
        body.set_rotation(Rotation::identity(), true);
        true
    }

    /// Number of dynamic bodies currently in the world. The ground is
    /// static and never counted.
    pub fn dynamic_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, b)| b.is_dynamic())
            .count()
    }

    /// World gravity vector.
    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /// Handle of the static ground body.
    pub fn ground(&self) -> RigidBodyHandle {
        self.ground
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
