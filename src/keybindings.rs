//! Keyboard shortcuts for the curation grid.

use ballcurator_ui::{KeyCode, KeyModifiers};

use crate::annotation::CircleRecord;

/// Which records the jump shortcut looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// Last grid entry flagged as removed
    LastRemoved,
    /// Last grid entry whose geometry was cleared
    LastCleared,
}

impl JumpTarget {
    /// Name used in telemetry and notices.
    pub fn name(&self) -> &'static str {
        match self {
            JumpTarget::LastRemoved => "removed",
            JumpTarget::LastCleared => "cleared",
        }
    }

    pub fn matches(&self, record: &CircleRecord) -> bool {
        match self {
            JumpTarget::LastRemoved => record.is_removed(),
            JumpTarget::LastCleared => record.is_cleared(),
        }
    }
}

/// Action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Jump(JumpTarget),
    /// Close the maximized inspector
    Dismiss,
}

/// Keybinding configuration for the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub jump_last_removed: KeyCode,
    pub jump_last_cleared: KeyCode,
    pub dismiss: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            jump_last_removed: KeyCode::R,
            jump_last_cleared: KeyCode::C,
            dismiss: KeyCode::Escape,
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The action for a key press. Chords with ctrl, alt or meta are left to
    /// the host.
    pub fn action_for_key(&self, key: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
        if modifiers.has_chord() {
            return None;
        }
        if key == self.dismiss {
            Some(KeyAction::Dismiss)
        } else if key == self.jump_last_removed {
            Some(KeyAction::Jump(JumpTarget::LastRemoved))
        } else if key == self.jump_last_cleared {
            Some(KeyAction::Jump(JumpTarget::LastCleared))
        } else {
            None
        }
    }
}
