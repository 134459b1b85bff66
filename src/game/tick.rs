//! Simulation Tick
//!
//! One fixed-interval advance of the world, as a plain synchronous
//! function so the whole rule set is testable without any networking.
//!
//! Per tick, in order:
//! 1. apply every player's pending input (kinematic nudge + yaw),
//! 2. advance the physics world by the fixed timestep,
//! 3. collect every player's transform for broadcast.
//!
//! The two-phase shape is deliberate: the nudge mutates positions before
//! integration, so gravity and ground contact resolve against the
//! already-updated position and the forward displacement is never
//! double-integrated by the solver.

use rapier3d::prelude::*;

use crate::game::physics::PhysicsWorld;
use crate::game::player::spawn_position;
use crate::game::registry::{ConnectionId, ConnectionRegistry};

/// One player's post-step transform, ready for broadcast.
#[derive(Debug, Clone)]
pub struct PlayerTransform {
    /// Owning connection.
    pub id: ConnectionId,
    /// World-space position.
    pub position: Vector<Real>,
    /// World-space orientation.
    pub rotation: Rotation<Real>,
}

/// Result of one tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Transforms for every live player, in stable id order.
    pub transforms: Vec<PlayerTransform>,
    /// Players whose position went non-finite and were reset to spawn.
    pub respawned: Vec<ConnectionId>,
}

/// Run one simulation tick over every registered player.
pub fn tick(world: &mut PhysicsWorld, registry: &ConnectionRegistry, dt: Real) -> TickResult {
    let mut result = TickResult::default();

    // 1. Kinematic input application, before integration.
    for player in registry.players() {
        player.apply_pending(world);
    }

    // 2. Dynamics.
    world.step(dt);

    // 3. Transform collection, with the numerical blow-up guard.
    for player in registry.players() {
        if world.respawn_if_invalid(player.handle(), spawn_position()) {
            result.respawned.push(player.id());
        }
        if let Some((position, rotation)) = world.transform(player.handle()) {
            result.transforms.push(PlayerTransform {
                id: player.id(),
                position,
                rotation,
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::InputState;
    use crate::game::player::{FORWARD_STEP, YAW_STEP};
    use crate::TICK_RATE;

    const DT: Real = 1.0 / TICK_RATE as Real;

    fn forward() -> InputState {
        InputState {
            forward: true,
            ..InputState::new()
        }
    }

    #[test]
    fn test_forward_displacement_accumulates_per_tick() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);
        registry.set_input(&id, forward());

        let ticks = 5;
        let mut last = None;
        for _ in 0..ticks {
            last = Some(tick(&mut world, &registry, DT));
        }

        let result = last.unwrap();
        let transform = &result.transforms[0];
        // Kinematic nudge along +Z, exact up to float error; gravity only
        // affects y while the body is in free fall.
        assert!((transform.position.z - ticks as Real * FORWARD_STEP).abs() < 1e-3);
        assert!(transform.position.x.abs() < 1e-4);
        assert!(
            transform.rotation.angle() < 1e-6,
            "Pure forward input must not rotate the body"
        );
    }

    #[test]
    fn test_yaw_accumulates_per_tick_without_moving() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);
        registry.set_input(
            &id,
            InputState {
                left: true,
                ..InputState::new()
            },
        );

        let ticks = 10;
        let mut last = None;
        for _ in 0..ticks {
            last = Some(tick(&mut world, &registry, DT));
        }

        let transform = &last.unwrap().transforms[0];
        assert!((transform.rotation.angle() - ticks as Real * YAW_STEP).abs() < 1e-4);
        assert!((transform.rotation.axis().unwrap().y - 1.0).abs() < 1e-4);
        // Rotation input contributes no displacement.
        assert!(transform.position.x.abs() < 1e-4);
        assert!(transform.position.z.abs() < 1e-4);
    }

    #[test]
    fn test_last_input_before_tick_wins() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);

        registry.set_input(&id, forward());
        registry.set_input(&id, InputState::new());

        let result = tick(&mut world, &registry, DT);
        assert!(result.transforms[0].position.z.abs() < 1e-6);
    }

    #[test]
    fn test_held_input_persists_across_ticks() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);

        // One input message, two ticks of movement.
        registry.set_input(&id, forward());
        tick(&mut world, &registry, DT);
        let result = tick(&mut world, &registry, DT);

        assert!((result.transforms[0].position.z - 2.0 * FORWARD_STEP).abs() < 1e-3);
    }

    #[test]
    fn test_disconnect_does_not_disturb_other_players() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let a = ConnectionId::new_unique();
        let b = ConnectionId::new_unique();
        registry.connect(a, &mut world);
        registry.connect(b, &mut world);
        registry.set_input(&b, forward());

        registry.disconnect(&a, &mut world);

        let result = tick(&mut world, &registry, DT);
        assert_eq!(result.transforms.len(), 1);
        let transform = &result.transforms[0];
        assert_eq!(transform.id, b);
        assert!((transform.position.z - FORWARD_STEP).abs() < 1e-4);
        assert_eq!(world.dynamic_body_count(), 1);
    }

    #[test]
    fn test_single_tick_end_to_end() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);
        registry.set_input(&id, forward());

        let result = tick(&mut world, &registry, DT);

        assert_eq!(result.transforms.len(), 1);
        assert!(result.respawned.is_empty());

        let transform = &result.transforms[0];
        // Spawn (0, 20, 0) plus the forward nudge; gravity pulls y down by
        // g * dt^2 at most during the first step.
        assert!(transform.position.x.abs() < 1e-4);
        assert!((transform.position.y - 20.0).abs() < 0.05);
        assert!((transform.position.z - FORWARD_STEP).abs() < 1e-4);
        assert!(transform.rotation.angle() < 1e-6);
    }

    #[test]
    fn test_idle_registry_ticks_cleanly() {
        let mut world = PhysicsWorld::new();
        let registry = ConnectionRegistry::new();

        let result = tick(&mut world, &registry, DT);
        assert!(result.transforms.is_empty());
        assert!(result.respawned.is_empty());
    }
}
