//! Keyboard input carried by curation messages.

use serde::{Deserialize, Serialize};

/// Keyboard keys that can be bound to curation shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers held.
    pub const NONE: KeyModifiers = KeyModifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only shift held.
    pub const SHIFT: KeyModifiers = KeyModifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Whether a chord modifier (ctrl, alt or meta) is held.
    pub fn has_chord(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_serializes_by_name() {
        let json = serde_json::to_string(&KeyCode::Escape).unwrap();
        assert_eq!(json, "\"Escape\"");
        let key: KeyCode = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(key, KeyCode::R);
    }

    #[test]
    fn test_chord_modifiers() {
        assert!(!KeyModifiers::NONE.has_chord());
        assert!(!KeyModifiers::SHIFT.has_chord());
        let ctrl = KeyModifiers {
            ctrl: true,
            ..KeyModifiers::NONE
        };
        assert!(ctrl.has_chord());
    }
}
