//! Connection Registry
//!
//! Maps connection ids to player bodies. Insertion on connect, removal on
//! disconnect. Unknown-id operations are tolerated no-ops: an `input`
//! message racing a disconnect is benign and must not error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::input::InputState;
use crate::game::physics::PhysicsWorld;
use crate::game::player::PlayerBody;

/// Identifies one client connection. Stable for the connection's lifetime,
/// serialized as a string on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh unique id.
    pub fn new_unique() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Live connection id -> player body mapping.
///
/// Invariant: every entry has exactly one dynamic body in the physics
/// world and vice versa. Both mutations below keep the two in lockstep, so
/// no orphaned body survives a tick.
#[derive(Default)]
pub struct ConnectionRegistry {
    // Sorted map keeps tick iteration order stable across runs.
    players: BTreeMap<ConnectionId, PlayerBody>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player body at the spawn point for `id` and register it.
    /// No-op if the id is already registered (no second body is created).
    pub fn connect(&mut self, id: ConnectionId, world: &mut PhysicsWorld) -> bool {
        if self.players.contains_key(&id) {
            return false;
        }
        self.players.insert(id, PlayerBody::spawn(id, world));
        true
    }

    /// Remove `id`'s body from the world and drop the entry. Idempotent:
    /// returns `false` (and does nothing) when the id is already gone.
    pub fn disconnect(&mut self, id: &ConnectionId, world: &mut PhysicsWorld) -> bool {
        match self.players.remove(id) {
            Some(player) => {
                world.remove_body(player.handle());
                true
            }
            None => false,
        }
    }

    /// Replace `id`'s pending input wholesale (last write wins). Returns
    /// `false` when the id is unknown, e.g. input arriving after a
    /// disconnect.
    pub fn set_input(&mut self, id: &ConnectionId, input: InputState) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.set_pending(input);
                true
            }
            None => false,
        }
    }

    /// Look up one player.
    pub fn get(&self, id: &ConnectionId) -> Option<&PlayerBody> {
        self.players.get(id)
    }

    /// Iterate players in stable id order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerBody> {
        self.players.values()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check whether no connections are live.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_connect_creates_exactly_one_body() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();

        assert!(registry.connect(id, &mut world));
        assert_eq!(registry.len(), 1);
        assert_eq!(world.dynamic_body_count(), 1);

        // Re-connecting the same id must not spawn a second body.
        assert!(!registry.connect(id, &mut world));
        assert_eq!(world.dynamic_body_count(), 1);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);

        assert!(registry.disconnect(&id, &mut world));
        assert_eq!(registry.len(), 0);
        assert_eq!(world.dynamic_body_count(), 0);

        // Second disconnect: no-op, no panic, nothing removed twice.
        assert!(!registry.disconnect(&id, &mut world));
        assert_eq!(world.dynamic_body_count(), 0);
    }

    #[test]
    fn test_set_input_overwrites_wholesale() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new_unique();
        registry.connect(id, &mut world);

        assert!(registry.set_input(
            &id,
            InputState {
                forward: true,
                left: true,
                right: false,
            }
        ));
        assert!(registry.set_input(
            &id,
            InputState {
                forward: false,
                left: false,
                right: true,
            }
        ));

        let pending = registry.get(&id).unwrap().pending();
        assert!(!pending.forward);
        assert!(!pending.left);
        assert!(pending.right);
    }

    #[test]
    fn test_set_input_unknown_id_is_noop() {
        let mut world = PhysicsWorld::new();
        let mut registry = ConnectionRegistry::new();

        let stale = ConnectionId::new_unique();
        assert!(!registry.set_input(&stale, InputState::new()));
        assert_eq!(world.dynamic_body_count(), 0);
    }

    proptest! {
        /// For any sequence of connect/disconnect events the registry and
        /// the physics world hold the same set of player bodies.
        #[test]
        fn prop_registry_and_world_stay_in_lockstep(ops in proptest::collection::vec(0u8..3, 1..64)) {
            let mut world = PhysicsWorld::new();
            let mut registry = ConnectionRegistry::new();
            let mut live: Vec<ConnectionId> = Vec::new();

            for op in ops {
                match op {
                    // Connect a fresh id.
                    0 => {
                        let id = ConnectionId::new_unique();
                        registry.connect(id, &mut world);
                        live.push(id);
                    }
                    // Disconnect a live id.
                    1 => {
                        if let Some(id) = live.pop() {
                            registry.disconnect(&id, &mut world);
                        }
                    }
                    // Disconnect an id that was never connected.
                    _ => {
                        let stranger = ConnectionId::new_unique();
                        registry.disconnect(&stranger, &mut world);
                    }
                }

                prop_assert_eq!(registry.len(), live.len());
                prop_assert_eq!(world.dynamic_body_count(), registry.len());
            }
        }
    }
}
