#![forbid(unsafe_code)]

//! Open/close lifecycle: presentation side effects and animation gating.
//!
//! The controller owns everything keyed off the `open` flag that is not
//! focus itself: backdrop display, enter/active/exit classes on the
//! animated node, sentinel tabbability, `aria-hidden` on the background
//! root, and the body scroll lock. When animation is configured the
//! settle actions (first focus, focus restore, class cleanup, hiding) are
//! deferred until the transition-completion signal scoped to the animated
//! node; signals bubbling from unrelated descendants are ignored.
//!
//! Sentinel tabbability and background `aria-hidden` track the `open`
//! flag edge itself, not the settle: a closing dialog stops capturing tab
//! traversal immediately.

use std::time::Duration;

use modalkit_dom::{Document, NodeId};
use web_time::Instant;

use crate::config::ModalOptions;

/// Grace period past the configured duration before a transition signal
/// is considered lost.
const SETTLE_SLACK: Duration = Duration::from_millis(50);

/// Resolved render-tree parts the controllers operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalParts {
    /// The component's own element.
    pub host: NodeId,
    /// Full-viewport backdrop; display toggles here.
    pub backdrop: NodeId,
    /// The dialog container carrying role and ARIA attributes.
    pub container: NodeId,
    /// Leading wrap sentinel.
    pub first_sentinel: NodeId,
    /// Trailing wrap sentinel.
    pub last_sentinel: NodeId,
    /// The configured content element.
    pub content: NodeId,
    /// Focus-walk root: `content` itself, or its encapsulated inner node
    /// in shadow mode. Animation classes are applied here.
    pub walk_root: NodeId,
}

/// Animation progress between a state change and its settle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AnimationPhase {
    #[default]
    Idle,
    Entering,
    Exiting,
}

/// Tracks whether settle actions are gated on a pending transition.
#[derive(Debug, Clone, Copy)]
pub struct ModalAnimation {
    enabled: bool,
    duration: Duration,
    phase: AnimationPhase,
    started_at: Option<Instant>,
}

impl ModalAnimation {
    fn new(enabled: bool, duration: Duration) -> Self {
        Self {
            enabled,
            duration,
            phase: AnimationPhase::Idle,
            started_at: None,
        }
    }

    /// Whether a transition is currently awaited.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.phase != AnimationPhase::Idle
    }

    fn start(&mut self, phase: AnimationPhase) {
        self.phase = phase;
        self.started_at = Some(Instant::now());
    }

    fn settle(&mut self) {
        self.phase = AnimationPhase::Idle;
        self.started_at = None;
    }

    /// Whether the awaited transition signal is considered lost at `now`.
    #[must_use]
    pub fn overdue_at(&self, now: Instant) -> bool {
        match self.started_at {
            Some(started) => now.saturating_duration_since(started) >= self.duration + SETTLE_SLACK,
            None => false,
        }
    }

    /// [`ModalAnimation::overdue_at`] against the current clock.
    #[must_use]
    pub fn overdue(&self) -> bool {
        self.overdue_at(Instant::now())
    }
}

/// Presentation controller keyed off the `open` flag.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    animation: ModalAnimation,
}

impl LifecycleController {
    #[must_use]
    pub fn new(options: &ModalOptions) -> Self {
        Self {
            animation: ModalAnimation::new(options.animation.enabled, options.animation.duration),
        }
    }

    /// Animation state, for overdue checks by the host.
    #[must_use]
    pub fn animation(&self) -> &ModalAnimation {
        &self.animation
    }

    /// Apply the visual open state. Returns `true` when the open settle
    /// actions should run synchronously; `false` when they are gated on
    /// the enter transition.
    pub fn begin_open(
        &mut self,
        doc: &mut Document,
        options: &ModalOptions,
        parts: &ModalParts,
    ) -> bool {
        doc.set_display(parts.backdrop, Some(&options.display));
        set_sentinels_tabbable(doc, parts, true);
        if let Some(app) = options.app_root {
            doc.set_attribute(app, "aria-hidden", "true");
        }
        doc.set_scroll_locked(true);

        // A reopen can interrupt a running exit transition.
        doc.remove_class(parts.walk_root, &options.animation.exit_class);

        if options.animation.enabled {
            doc.add_class(parts.walk_root, &options.animation.enter_class);
            self.animation.start(AnimationPhase::Entering);
            false
        } else {
            doc.add_class(parts.walk_root, &options.animation.active_class);
            true
        }
    }

    /// The enter transition completed: mark the settled-open state.
    pub fn settle_open(&mut self, doc: &mut Document, options: &ModalOptions, parts: &ModalParts) {
        doc.add_class(parts.walk_root, &options.animation.active_class);
        self.animation.settle();
    }

    /// Apply the visual close state. Returns `true` when the close settle
    /// actions should run synchronously; `false` when they are gated on
    /// the exit transition.
    pub fn begin_close(
        &mut self,
        doc: &mut Document,
        options: &ModalOptions,
        parts: &ModalParts,
    ) -> bool {
        set_sentinels_tabbable(doc, parts, false);
        if let Some(app) = options.app_root {
            doc.set_attribute(app, "aria-hidden", "false");
        }
        doc.set_scroll_locked(false);

        if options.animation.enabled {
            doc.remove_class(parts.walk_root, &options.animation.active_class);
            doc.add_class(parts.walk_root, &options.animation.exit_class);
            self.animation.start(AnimationPhase::Exiting);
            false
        } else {
            doc.remove_class(parts.walk_root, &options.animation.active_class);
            doc.set_display(parts.backdrop, Some("none"));
            true
        }
    }

    /// The exit transition completed: clear transient classes and hide.
    pub fn settle_close(&mut self, doc: &mut Document, options: &ModalOptions, parts: &ModalParts) {
        doc.remove_class(parts.walk_root, &options.animation.enter_class);
        doc.remove_class(parts.walk_root, &options.animation.exit_class);
        doc.remove_class(parts.walk_root, &options.animation.active_class);
        doc.set_display(parts.backdrop, Some("none"));
        self.animation.settle();
    }

    /// Whether a transition-completion signal on `target` belongs to this
    /// dialog's animated node.
    #[must_use]
    pub fn transition_matches(&self, parts: &ModalParts, target: NodeId) -> bool {
        self.animation.is_animating() && target == parts.walk_root
    }

    /// Whether the pending transition is an enter (as opposed to exit).
    #[must_use]
    pub fn entering(&self) -> bool {
        self.animation.phase == AnimationPhase::Entering
    }

    /// Whether the pending transition is an exit.
    #[must_use]
    pub fn exiting(&self) -> bool {
        self.animation.phase == AnimationPhase::Exiting
    }
}

fn set_sentinels_tabbable(doc: &mut Document, parts: &ModalParts, tabbable: bool) {
    for sentinel in [parts.first_sentinel, parts.last_sentinel] {
        doc.set_focusable(sentinel, tabbable);
        if tabbable {
            doc.set_attribute(sentinel, "tabindex", "0");
        } else {
            doc.remove_attribute(sentinel, "tabindex");
        }
    }
}
