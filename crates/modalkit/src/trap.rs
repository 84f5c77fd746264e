#![forbid(unsafe_code)]

//! Focus trap state machine.
//!
//! # States
//!
//! `Closed → Opening → TrappedOpen → Closing → Closed`, edge-triggered by
//! the `open` flag. When no animation is configured the `Opening` and
//! `Closing` states are passed through synchronously; otherwise they last
//! until the matching transition-completion signal.
//!
//! # Invariants
//!
//! 1. **Capture once, restore once**: the pre-open focus is captured on
//!    the `Closed → Opening` edge only, resolved recursively to the true
//!    leaf through encapsulated scopes, and consumed on `Closing → Closed`
//!    at most once. An open interrupted by a close keeps the original
//!    memory.
//!
//! 2. **Guarded corrective moves**: every focus move the trap issues arms
//!    the re-entrancy guard with the moved-to target, so the resulting
//!    focus notification is absorbed instead of being reinterpreted as a
//!    boundary escape. The guard only absorbs a notification for that
//!    exact target; anything else is handled normally.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Restore target detached | Element removed while open | Silent no-op |
//! | First-focus target refuses focus | Hidden or unfocusable | Falls back to boundary walk, then container |
//! | No focusable descendants | Empty content | Focus settles on the container |

use modalkit_dom::{Document, NodeId};

use crate::boundary;

/// Lifecycle state of the focus trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrapPhase {
    #[default]
    Closed,
    Opening,
    TrappedOpen,
    Closing,
}

/// Which edge of the boundary a wrap redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    First,
    Last,
}

/// The focus trap controller: pre-open focus memory, forced first focus,
/// sentinel wrap redirection, and deterministic restore.
#[derive(Debug, Clone, Default)]
pub struct FocusTrap {
    phase: TrapPhase,
    focus_before_open: Option<NodeId>,
    /// Target of the trap's own pending focus notification, absorbed on
    /// delivery instead of being reinterpreted as a boundary escape.
    ignore_focus_changes: Option<NodeId>,
}

impl FocusTrap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn phase(&self) -> TrapPhase {
        self.phase
    }

    /// The captured pre-open focus target, while one is held.
    #[must_use]
    pub fn focus_before_open(&self) -> Option<NodeId> {
        self.focus_before_open
    }

    /// `open` became true. Captures the current true focus leaf as the
    /// restore target. Reopening while a close is still animating keeps
    /// the originally captured target.
    pub fn begin_open(&mut self, doc: &Document) {
        match self.phase {
            TrapPhase::Closed => {
                self.focus_before_open = doc.active_leaf();
                self.phase = TrapPhase::Opening;
            }
            TrapPhase::Closing => {
                self.phase = TrapPhase::Opening;
            }
            TrapPhase::Opening | TrapPhase::TrappedOpen => {}
        }
    }

    /// The open transition settled. Forces focus to the first-focus
    /// target: the explicit configuration reference when given, otherwise
    /// the first focusable descendant of `walk_root`, otherwise
    /// `container`.
    pub fn settle_open(
        &mut self,
        doc: &mut Document,
        explicit: Option<NodeId>,
        walk_root: NodeId,
        container: NodeId,
    ) {
        if self.phase != TrapPhase::Opening {
            return;
        }

        let landed = match explicit {
            Some(target) if self.focus_guarded(doc, target) => true,
            _ => self.focus_boundary(doc, walk_root, Edge::First).is_some(),
        };
        if !landed {
            self.focus_guarded(doc, container);
        }
        self.phase = TrapPhase::TrappedOpen;
    }

    /// `open` became false.
    pub fn begin_close(&mut self) {
        if matches!(self.phase, TrapPhase::TrappedOpen | TrapPhase::Opening) {
            self.phase = TrapPhase::Closing;
        }
    }

    /// The close transition settled. Restores focus to the captured
    /// pre-open target when it is still attached; otherwise a silent
    /// no-op. The memory is consumed either way.
    pub fn settle_close(&mut self, doc: &mut Document) {
        if self.phase != TrapPhase::Closing {
            return;
        }
        if let Some(previous) = self.focus_before_open.take()
            && doc.is_attached(previous)
        {
            self.focus_guarded(doc, previous);
        }
        self.phase = TrapPhase::Closed;
    }

    /// React to a focus notification. Returns `true` when the event was
    /// absorbed (own corrective move) or answered with a wrap redirect.
    ///
    /// Focusing the leading sentinel redirects to the last focusable
    /// descendant; the trailing sentinel to the first. With no focusable
    /// descendants both redirect to `container`, closing the cycle on the
    /// dialog itself.
    pub fn handle_focus_in(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        first_sentinel: NodeId,
        last_sentinel: NodeId,
        walk_root: NodeId,
        container: NodeId,
    ) -> bool {
        if self.ignore_focus_changes.take() == Some(target) {
            return true;
        }
        if self.phase != TrapPhase::TrappedOpen {
            return false;
        }

        let edge = if target == first_sentinel {
            Edge::Last
        } else if target == last_sentinel {
            Edge::First
        } else {
            return false;
        };

        if self.focus_boundary(doc, walk_root, edge).is_none() {
            self.focus_guarded(doc, container);
        }
        true
    }

    /// Focus `node`, arming the re-entrancy guard iff focus actually
    /// moved (a move queues a notification that must be absorbed). The
    /// guard remembers the moved-to target, so a notification that was
    /// dropped by the host cannot wrongly absorb an unrelated escape.
    fn focus_guarded(&mut self, doc: &mut Document, node: NodeId) -> bool {
        let before = doc.active_leaf();
        let ok = doc.focus(node);
        if ok && before != doc.active_leaf() {
            self.ignore_focus_changes = Some(node);
        }
        ok
    }

    fn focus_boundary(
        &mut self,
        doc: &mut Document,
        walk_root: NodeId,
        edge: Edge,
    ) -> Option<NodeId> {
        let before = doc.active_leaf();
        let found = match edge {
            Edge::First => boundary::first_focusable(doc, walk_root),
            Edge::Last => boundary::last_focusable(doc, walk_root),
        };
        if found.is_some() && before != doc.active_leaf() {
            self.ignore_focus_changes = found;
        }
        found
    }
}
