//! Pending Input State
//!
//! The server keeps exactly one `InputState` per player, replaced
//! wholesale whenever an `input` message arrives (last write wins, no
//! field-level merging). The simulation tick reads it; it is never
//! cleared, so a held key keeps moving the body until the client sends a
//! release.

use serde::{Deserialize, Serialize};

/// Input flags for one player, as submitted by the client.
///
/// Every field defaults to `false`, so a partial payload decodes with the
/// missing keys released rather than being rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    /// Move along the body's current forward axis.
    #[serde(default)]
    pub forward: bool,

    /// Yaw counterclockwise (viewed from above).
    #[serde(default)]
    pub left: bool,

    /// Yaw clockwise (viewed from above).
    #[serde(default)]
    pub right: bool,
}

impl InputState {
    /// Create a released (all-false) input state.
    pub const fn new() -> Self {
        Self {
            forward: false,
            left: false,
            right: false,
        }
    }

    /// Check if no key is held.
    #[inline]
    pub fn is_idle(&self) -> bool {
        !self.forward && !self.left && !self.right
    }

    /// Yaw direction for this input: `+1` for left alone, `-1` for right
    /// alone, `0` otherwise.
    ///
    /// Left and right held together cancel instead of resolving by
    /// evaluation order, so only the exactly-one-key case ever rotates.
    #[inline]
    pub fn yaw_sign(&self) -> i8 {
        match (self.left, self.right) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let input = InputState::default();
        assert!(input.is_idle());
        assert_eq!(input, InputState::new());
    }

    #[test]
    fn test_yaw_sign() {
        let mut input = InputState::new();
        assert_eq!(input.yaw_sign(), 0);

        input.left = true;
        assert_eq!(input.yaw_sign(), 1);

        input.left = false;
        input.right = true;
        assert_eq!(input.yaw_sign(), -1);

        // Both held: cancel, no rotation.
        input.left = true;
        assert_eq!(input.yaw_sign(), 0);
    }

    #[test]
    fn test_partial_payload_defaults_missing_fields() {
        let input: InputState = serde_json::from_str(r#"{"forward":true}"#).unwrap();
        assert!(input.forward);
        assert!(!input.left);
        assert!(!input.right);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let input: InputState =
            serde_json::from_str(r#"{"forward":true,"jump":true}"#).unwrap();
        assert!(input.forward);
        assert!(!input.left);
    }

    #[test]
    fn test_json_roundtrip() {
        let input = InputState {
            forward: true,
            left: false,
            right: true,
        };
        let json = serde_json::to_string(&input).unwrap();
        let back: InputState = serde_json::from_str(&json).unwrap();
        assert_eq!(input, back);
    }
}
