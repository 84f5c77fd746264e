#![forbid(unsafe_code)]

//! UI event types routed by the host loop.
//!
//! Events are plain data. The host owns delivery order: events produced
//! while handling an event (for example the focus notification emitted by
//! a programmatic focus move) are queued on the [`Document`] and drained
//! at the end of the current turn, never dispatched re-entrantly.
//!
//! [`Document`]: crate::document::Document

use bitflags::bitflags;

use crate::document::NodeId;

bitflags! {
    /// Keyboard modifier state attached to a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// Key identity for the keys the dialog cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Enter,
    Escape,
    Tab,
}

/// Press/release phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A single keyboard event from the global stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain key press with no modifiers.
    #[must_use]
    pub const fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }
}

/// Mouse button for click events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// An event delivered to widgets by the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A key event from the global keyboard stream.
    Key(KeyEvent),
    /// A pointer click whose hit target has already been resolved.
    Click { target: NodeId, button: MouseButton },
    /// Document focus settled on `target`.
    FocusIn { target: NodeId },
    /// A CSS transition on `target` ran to completion.
    TransitionEnd { target: NodeId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_has_no_modifiers() {
        let event = KeyEvent::press(KeyCode::Escape);
        assert_eq!(event.modifiers, Modifiers::empty());
        assert_eq!(event.kind, KeyEventKind::Press);
    }

    #[test]
    fn modifiers_compose() {
        let mods = Modifiers::SHIFT | Modifiers::CONTROL;
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::ALT));
    }
}
