#![forbid(unsafe_code)]

//! Focus boundary location.
//!
//! Finds the first or last focusable descendant of a content root by
//! walking element descendants and *attempting focus* on each candidate,
//! keeping the one where document focus actually lands. Probing by real
//! focus attempts (instead of tabindex parsing or a tag allow-list)
//! handles custom interactive elements without a fixed allow-list, at the
//! cost of an instantaneous focus flicker during the walk.
//!
//! A refused attempt leaves focus untouched, so a walk performs at most
//! one actual focus move: the successful probe is the result. A root with
//! no focusable descendants yields `None`.

use modalkit_dom::{Document, NodeId};

/// First focusable descendant of `root` in depth-first pre-order, or
/// `None` when the subtree has no focusable descendants. On success the
/// returned element holds document focus.
pub fn first_focusable(doc: &mut Document, root: NodeId) -> Option<NodeId> {
    let children = doc.children(root).to_vec();
    for child in children {
        if doc.focus(child) {
            return Some(child);
        }
        if let Some(found) = first_focusable(doc, child) {
            return Some(found);
        }
    }
    None
}

/// Last focusable descendant of `root` in reverse post-order (deepest
/// last descendant first), or `None`. On success the returned element
/// holds document focus.
pub fn last_focusable(doc: &mut Document, root: NodeId) -> Option<NodeId> {
    let children = doc.children(root).to_vec();
    for child in children.into_iter().rev() {
        if let Some(found) = last_focusable(doc, child) {
            return Some(found);
        }
        if doc.focus(child) {
            return Some(child);
        }
    }
    None
}
