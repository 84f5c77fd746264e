#![forbid(unsafe_code)]

//! The modal dialog widget.
//!
//! [`ModalDialog::attach`] resolves the host element's configuration,
//! builds the render tree (backdrop wrapping sentinel, container,
//! sentinel) and re-homes the configured content element into the
//! container. From there the widget is driven by two entry points:
//! [`ModalDialog::set_open`] for the open flag, and
//! [`ModalDialog::handle_event`] for input, focus and transition events.
//!
//! # Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | `open` is edge triggered; redundant writes are no-ops | [`ModalDialog::set_open`] |
//! | while trapped, Tab cycles within the content | sentinel redirects in [`FocusTrap::handle_focus_in`] |
//! | focus is captured once per open and restored once per close | [`FocusTrap`] phase machine |
//! | dismissal is suppressed while `disabled` | [`ModalDialog::handle_event`] |
//! | transition signals from unrelated nodes are ignored | [`LifecycleController::transition_matches`] |
//!
//! # Failure Modes
//!
//! Configuration errors surface at attach time. After attach the only
//! error left is a corrupted render tree ([`ModalError::StructureMissing`]);
//! focus probes and stale restore targets degrade silently.

use modalkit_dom::{Document, Event, KeyCode, KeyEventKind, NodeId};

use crate::config::{self, ModalOptions};
use crate::error::ModalError;
use crate::lifecycle::{LifecycleController, ModalParts};
use crate::trap::{FocusTrap, TrapPhase};

/// Dismissal intents surfaced to the host. The dialog has already closed
/// itself by the time the action is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModalAction {
    /// Escape was pressed while open.
    EscapePressed,
    /// The backdrop (outside the dialog container) was clicked.
    BackdropClicked,
}

/// An attached modal dialog.
#[derive(Debug, Clone)]
pub struct ModalDialog {
    host: NodeId,
    options: ModalOptions,
    parts: ModalParts,
    trap: FocusTrap,
    lifecycle: LifecycleController,
    /// Where the content element lived before attach, for detach.
    content_home: Option<NodeId>,
    open: bool,
    attached: bool,
}

impl ModalDialog {
    /// Resolve `host`'s attributes and build the dialog's render tree
    /// beneath it. The configured content element is moved into the
    /// dialog container and moved back on [`ModalDialog::detach`].
    ///
    /// When the host carries `open="true"` the dialog opens immediately.
    pub fn attach(doc: &mut Document, host: NodeId) -> Result<Self, ModalError> {
        let options = config::resolve(doc, host)?;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("modal_attach", host = host.raw()).entered();

        let backdrop = doc.create_element("div");
        doc.add_class(backdrop, "backdrop");
        doc.set_display(backdrop, Some("none"));
        doc.append_child(host, backdrop);

        let first_sentinel = doc.create_element("div");
        doc.append_child(backdrop, first_sentinel);

        let container = build_container(doc, &options);
        doc.append_child(backdrop, container);

        let last_sentinel = doc.create_element("div");
        doc.append_child(backdrop, last_sentinel);

        let content_home = doc.parent(options.content);
        doc.append_child(container, options.content);

        let walk_root = resolve_walk_root(doc, &options)?;

        let parts = ModalParts {
            host,
            backdrop,
            container,
            first_sentinel,
            last_sentinel,
            content: options.content,
            walk_root,
        };

        let lifecycle = LifecycleController::new(&options);
        let mut dialog = Self {
            host,
            options,
            parts,
            trap: FocusTrap::new(),
            lifecycle,
            content_home,
            open: false,
            attached: true,
        };

        if doc.attribute(host, "open") == Some("true") {
            // Reflect through the normal path so the attribute and the
            // presentation cannot disagree.
            doc.remove_attribute(host, "open");
            dialog.set_open(doc, true)?;
        }
        Ok(dialog)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn phase(&self) -> TrapPhase {
        self.trap.phase()
    }

    #[must_use]
    pub fn options(&self) -> &ModalOptions {
        &self.options
    }

    #[must_use]
    pub fn parts(&self) -> &ModalParts {
        &self.parts
    }

    /// Set the open flag. Edge triggered: writing the current value is a
    /// no-op. The flag is mirrored to the host's `open` attribute.
    pub fn set_open(&mut self, doc: &mut Document, open: bool) -> Result<(), ModalError> {
        if !self.attached || open == self.open {
            return Ok(());
        }
        if !doc.is_attached(self.parts.backdrop) {
            return Err(ModalError::StructureMissing("backdrop"));
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("modal_set_open", open).entered();

        self.open = open;
        doc.set_attribute(self.host, "open", if open { "true" } else { "false" });

        if open {
            self.trap.begin_open(doc);
            if self.lifecycle.begin_open(doc, &self.options, &self.parts) {
                self.settle_open(doc);
            }
        } else {
            self.trap.begin_close();
            if self.lifecycle.begin_close(doc, &self.options, &self.parts) {
                self.trap.settle_close(doc);
            }
        }
        Ok(())
    }

    /// Feed one event through the dialog. Dismissal events close the
    /// dialog and surface the intent as a [`ModalAction`].
    pub fn handle_event(
        &mut self,
        doc: &mut Document,
        event: &Event,
    ) -> Result<Option<ModalAction>, ModalError> {
        if !self.attached {
            return Ok(None);
        }
        match event {
            Event::Key(key)
                if key.code == KeyCode::Escape && key.kind == KeyEventKind::Press =>
            {
                if self.open && !self.options.disabled {
                    self.set_open(doc, false)?;
                    return Ok(Some(ModalAction::EscapePressed));
                }
                Ok(None)
            }
            Event::Click { target, .. } => {
                if *target == self.parts.backdrop && self.open && !self.options.disabled {
                    self.set_open(doc, false)?;
                    return Ok(Some(ModalAction::BackdropClicked));
                }
                Ok(None)
            }
            Event::FocusIn { target } => {
                self.trap.handle_focus_in(
                    doc,
                    *target,
                    self.parts.first_sentinel,
                    self.parts.last_sentinel,
                    self.parts.walk_root,
                    self.parts.container,
                );
                Ok(None)
            }
            Event::TransitionEnd { target } => {
                if self.lifecycle.transition_matches(&self.parts, *target) {
                    self.settle_transition(doc);
                }
                Ok(None)
            }
            Event::Key(_) => Ok(None),
        }
    }

    /// Force a pending transition to settle if its signal is overdue.
    /// Returns `true` when a settle ran. A lost transition-completion
    /// signal must not wedge the dialog mid-lifecycle.
    pub fn settle_overdue(&mut self, doc: &mut Document) -> bool {
        if !self.attached {
            return false;
        }
        if self.lifecycle.animation().is_animating() && self.lifecycle.animation().overdue() {
            #[cfg(feature = "tracing")]
            tracing::debug!(host = self.host.raw(), "transition signal overdue, forcing settle");
            self.settle_transition(doc);
            return true;
        }
        false
    }

    /// Tear the dialog down: close if open (restoring focus), move the
    /// content element back to its original parent and remove the
    /// render tree. Safe to call more than once.
    pub fn detach(&mut self, doc: &mut Document) {
        if !self.attached {
            return;
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("modal_detach", host = self.host.raw()).entered();

        if self.open {
            self.open = false;
            doc.set_attribute(self.host, "open", "false");
            self.trap.begin_close();
            self.lifecycle.begin_close(doc, &self.options, &self.parts);
        }
        // A close may still be mid-transition; the content is about to be
        // re-homed, so clear the animation classes and restore focus
        // without waiting for the signal.
        self.lifecycle.settle_close(doc, &self.options, &self.parts);
        self.trap.settle_close(doc);

        let home = self.content_home.unwrap_or_else(|| doc.root());
        if doc.is_attached(home) {
            doc.append_child(home, self.parts.content);
        } else {
            doc.remove(self.parts.content);
        }
        doc.remove(self.parts.backdrop);
        self.attached = false;
    }

    fn settle_transition(&mut self, doc: &mut Document) {
        if self.lifecycle.entering() {
            self.lifecycle.settle_open(doc, &self.options, &self.parts);
            self.settle_open(doc);
        } else if self.lifecycle.exiting() {
            self.lifecycle.settle_close(doc, &self.options, &self.parts);
            self.trap.settle_close(doc);
        }
    }

    fn settle_open(&mut self, doc: &mut Document) {
        let explicit = self.explicit_first_focus(doc);
        self.trap
            .settle_open(doc, explicit, self.parts.walk_root, self.parts.container);
    }

    /// The explicit first-focus target: the configuration reference, or
    /// the one designated by the content's encapsulated scope.
    fn explicit_first_focus(&self, doc: &Document) -> Option<NodeId> {
        self.options.first_focus.or_else(|| {
            if self.options.shadow {
                doc.shadow_first_focus(self.options.content)
            } else {
                None
            }
        })
    }
}

fn build_container(doc: &mut Document, options: &ModalOptions) -> NodeId {
    let container = doc.create_element("div");
    doc.set_attribute(container, "role", options.role.as_str());
    doc.set_attribute(container, "aria-modal", "true");
    match &options.name {
        config::AccessibleName::Label(text) => doc.set_attribute(container, "aria-label", text),
        config::AccessibleName::LabelledBy(id) => {
            doc.set_attribute(container, "aria-labelledby", id);
        }
    }
    if let Some(id) = &options.described_by {
        doc.set_attribute(container, "aria-describedby", id);
    }
    // Focusable fallback target for content with no focusable descendants.
    doc.set_attribute(container, "tabindex", "-1");
    doc.set_focusable(container, true);
    container
}

/// In shadow mode the focus walk starts one level inside the content's
/// encapsulated scope, which must expose exactly one child.
fn resolve_walk_root(doc: &Document, options: &ModalOptions) -> Result<NodeId, ModalError> {
    if !options.shadow {
        return Ok(options.content);
    }
    let scope = doc
        .shadow_root(options.content)
        .ok_or(ModalError::MissingShadowRoot)?;
    match doc.children(scope) {
        [only] => Ok(*only),
        children => Err(ModalError::AmbiguousShadowContent {
            children: children.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modalkit_dom::KeyEvent;

    struct Fixture {
        doc: Document,
        host: NodeId,
        trigger: NodeId,
        inputs: Vec<NodeId>,
    }

    fn fixture(extra_attrs: &[(&str, &str)]) -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();

        let trigger = doc.create_element("button");
        doc.set_focusable(trigger, true);
        doc.append_child(root, trigger);

        let content = doc.create_element("div");
        doc.set_element_id(content, "content");
        doc.append_child(root, content);
        let mut inputs = Vec::new();
        for _ in 0..2 {
            let input = doc.create_element("input");
            doc.set_focusable(input, true);
            doc.append_child(content, input);
            inputs.push(input);
        }

        let host = doc.create_element("modal-dialog");
        doc.append_child(root, host);
        doc.set_attribute(host, "aria-label", "Settings");
        doc.set_attribute(host, "node", "content");
        for (name, value) in extra_attrs {
            doc.set_attribute(host, name, value);
        }

        Fixture {
            doc,
            host,
            trigger,
            inputs,
        }
    }

    fn pump(dialog: &mut ModalDialog, doc: &mut Document) {
        let events = doc.drain_events();
        for event in events {
            dialog.handle_event(doc, &event).unwrap();
        }
    }

    #[test]
    fn attach_builds_container_semantics() {
        let mut f = fixture(&[("aria-describedby", "desc")]);
        let dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();

        let parts = dialog.parts();
        assert_eq!(f.doc.attribute(parts.container, "role"), Some("dialog"));
        assert_eq!(f.doc.attribute(parts.container, "aria-modal"), Some("true"));
        assert_eq!(
            f.doc.attribute(parts.container, "aria-label"),
            Some("Settings")
        );
        assert_eq!(
            f.doc.attribute(parts.container, "aria-describedby"),
            Some("desc")
        );
        assert_eq!(f.doc.display(parts.backdrop), Some("none"));
        // Content was re-homed into the container.
        assert_eq!(f.doc.parent(parts.content), Some(parts.container));
        assert_eq!(
            f.doc.children(parts.backdrop),
            [parts.first_sentinel, parts.container, parts.last_sentinel]
        );
    }

    #[test]
    fn open_focuses_first_focusable_and_close_restores() {
        let mut f = fixture(&[]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();

        dialog.set_open(&mut f.doc, true).unwrap();
        assert!(dialog.is_open());
        assert_eq!(f.doc.attribute(f.host, "open"), Some("true"));
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[0]));
        pump(&mut dialog, &mut f.doc);

        dialog.set_open(&mut f.doc, false).unwrap();
        assert!(!dialog.is_open());
        assert_eq!(f.doc.attribute(f.host, "open"), Some("false"));
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
    }

    #[test]
    fn redundant_open_writes_are_no_ops() {
        let mut f = fixture(&[]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();

        dialog.set_open(&mut f.doc, true).unwrap();
        pump(&mut dialog, &mut f.doc);
        f.doc.focus(f.inputs[1]);
        pump(&mut dialog, &mut f.doc);

        // A second write must not re-capture or move focus.
        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[1]));

        dialog.set_open(&mut f.doc, false).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
    }

    #[test]
    fn escape_closes_and_reports() {
        let mut f = fixture(&[]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        dialog.set_open(&mut f.doc, true).unwrap();
        pump(&mut dialog, &mut f.doc);

        let escape = Event::Key(KeyEvent::press(KeyCode::Escape));
        let action = dialog.handle_event(&mut f.doc, &escape).unwrap();
        assert_eq!(action, Some(ModalAction::EscapePressed));
        assert!(!dialog.is_open());

        // Closed dialogs ignore Escape.
        let action = dialog.handle_event(&mut f.doc, &escape).unwrap();
        assert_eq!(action, None);
    }

    #[test]
    fn disabled_suppresses_dismissal() {
        let mut f = fixture(&[("disabled", "true")]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        dialog.set_open(&mut f.doc, true).unwrap();
        pump(&mut dialog, &mut f.doc);

        let escape = Event::Key(KeyEvent::press(KeyCode::Escape));
        assert_eq!(dialog.handle_event(&mut f.doc, &escape).unwrap(), None);
        let click = Event::Click {
            target: dialog.parts().backdrop,
            button: modalkit_dom::MouseButton::Left,
        };
        assert_eq!(dialog.handle_event(&mut f.doc, &click).unwrap(), None);
        assert!(dialog.is_open());
    }

    #[test]
    fn backdrop_click_closes_but_container_click_does_not() {
        let mut f = fixture(&[]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        dialog.set_open(&mut f.doc, true).unwrap();
        pump(&mut dialog, &mut f.doc);

        let inside = Event::Click {
            target: dialog.parts().container,
            button: modalkit_dom::MouseButton::Left,
        };
        assert_eq!(dialog.handle_event(&mut f.doc, &inside).unwrap(), None);
        assert!(dialog.is_open());

        let outside = Event::Click {
            target: dialog.parts().backdrop,
            button: modalkit_dom::MouseButton::Left,
        };
        assert_eq!(
            dialog.handle_event(&mut f.doc, &outside).unwrap(),
            Some(ModalAction::BackdropClicked)
        );
        assert!(!dialog.is_open());
    }

    #[test]
    fn initially_open_attribute_opens_at_attach() {
        let mut f = fixture(&[("open", "true")]);
        let dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        assert!(dialog.is_open());
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[0]));
        assert_eq!(f.doc.attribute(f.host, "open"), Some("true"));
    }

    #[test]
    fn explicit_first_focus_wins() {
        let mut f = fixture(&[("first-focus", "second")]);
        f.doc.set_element_id(f.inputs[1], "second");
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();

        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[1]));
    }

    #[test]
    fn animated_open_defers_focus_until_transition_end() {
        let mut f = fixture(&[("animation", "true")]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();

        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
        assert_eq!(dialog.phase(), TrapPhase::Opening);

        // A transition finishing on a descendant is not ours.
        let stray = Event::TransitionEnd {
            target: f.inputs[0],
        };
        dialog.handle_event(&mut f.doc, &stray).unwrap();
        assert_eq!(dialog.phase(), TrapPhase::Opening);

        let done = Event::TransitionEnd {
            target: dialog.parts().walk_root,
        };
        dialog.handle_event(&mut f.doc, &done).unwrap();
        assert_eq!(dialog.phase(), TrapPhase::TrappedOpen);
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[0]));
    }

    #[test]
    fn animated_close_restores_focus_at_transition_end() {
        let mut f = fixture(&[("animation", "true")]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();
        dialog.set_open(&mut f.doc, true).unwrap();
        let done = Event::TransitionEnd {
            target: dialog.parts().walk_root,
        };
        dialog.handle_event(&mut f.doc, &done).unwrap();
        pump(&mut dialog, &mut f.doc);

        dialog.set_open(&mut f.doc, false).unwrap();
        // Still inside the exit transition.
        assert_eq!(f.doc.active_leaf(), Some(f.inputs[0]));
        assert_eq!(f.doc.display(dialog.parts().backdrop), Some("block"));

        dialog.handle_event(&mut f.doc, &done).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
        assert_eq!(f.doc.display(dialog.parts().backdrop), Some("none"));
    }

    #[test]
    fn overdue_transition_is_forced_to_settle() {
        let mut f = fixture(&[("animation", "true"), ("duration", "0")]);
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(dialog.phase(), TrapPhase::Opening);

        std::thread::sleep(std::time::Duration::from_millis(60));
        assert!(dialog.settle_overdue(&mut f.doc));
        assert_eq!(dialog.phase(), TrapPhase::TrappedOpen);
        assert!(!dialog.settle_overdue(&mut f.doc));
    }

    #[test]
    fn detach_restores_content_and_focus() {
        let mut f = fixture(&[]);
        let root = f.doc.root();
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();
        dialog.set_open(&mut f.doc, true).unwrap();
        pump(&mut dialog, &mut f.doc);

        let content = dialog.parts().content;
        let backdrop = dialog.parts().backdrop;
        dialog.detach(&mut f.doc);
        assert_eq!(f.doc.parent(content), Some(root));
        assert!(!f.doc.is_attached(backdrop));
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
        assert!(!f.doc.scroll_locked());

        // Repeat detach and post-detach events are inert.
        dialog.detach(&mut f.doc);
        let escape = Event::Key(KeyEvent::press(KeyCode::Escape));
        assert_eq!(dialog.handle_event(&mut f.doc, &escape).unwrap(), None);
    }

    #[test]
    fn detach_mid_close_transition_leaves_content_clean() {
        let mut f = fixture(&[("animation", "true")]);
        let root = f.doc.root();
        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        f.doc.focus(f.trigger);
        f.doc.drain_events();

        let content = dialog.parts().content;
        let done = Event::TransitionEnd {
            target: dialog.parts().walk_root,
        };
        dialog.set_open(&mut f.doc, true).unwrap();
        dialog.handle_event(&mut f.doc, &done).unwrap();
        pump(&mut dialog, &mut f.doc);

        // Detach while the exit transition is still pending.
        dialog.set_open(&mut f.doc, false).unwrap();
        dialog.detach(&mut f.doc);

        assert_eq!(f.doc.parent(content), Some(root));
        assert!(!f.doc.has_class(content, "fade"));
        assert!(!f.doc.has_class(content, "hide"));
        assert!(!f.doc.has_class(content, "active"));
        assert_eq!(f.doc.active_leaf(), Some(f.trigger));
    }

    #[test]
    fn shadow_mode_walks_the_inner_scope() {
        let mut f = fixture(&[("shadow", "true")]);
        // Shadow content: scope with a single wrapper holding the inputs.
        let scope = f.doc.attach_shadow(f.doc.get_element_by_id("content").unwrap());
        let wrapper = f.doc.create_element("div");
        f.doc.append_child(scope, wrapper);
        let inner = f.doc.create_element("input");
        f.doc.set_focusable(inner, true);
        f.doc.append_child(wrapper, inner);

        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        assert_eq!(dialog.parts().walk_root, wrapper);

        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(inner));
    }

    #[test]
    fn shadow_scope_may_designate_first_focus() {
        let mut f = fixture(&[("shadow", "true")]);
        let content = f.doc.get_element_by_id("content").unwrap();
        let scope = f.doc.attach_shadow(content);
        let wrapper = f.doc.create_element("div");
        f.doc.append_child(scope, wrapper);
        let first = f.doc.create_element("input");
        f.doc.set_focusable(first, true);
        f.doc.append_child(wrapper, first);
        let preferred = f.doc.create_element("input");
        f.doc.set_focusable(preferred, true);
        f.doc.append_child(wrapper, preferred);
        f.doc.set_shadow_first_focus(content, Some(preferred));

        let mut dialog = ModalDialog::attach(&mut f.doc, f.host).unwrap();
        dialog.set_open(&mut f.doc, true).unwrap();
        assert_eq!(f.doc.active_leaf(), Some(preferred));
    }

    #[test]
    fn shadow_mode_requires_a_scope() {
        let mut f = fixture(&[("shadow", "true")]);
        let err = ModalDialog::attach(&mut f.doc, f.host).unwrap_err();
        assert_eq!(err, ModalError::MissingShadowRoot);
    }
}
