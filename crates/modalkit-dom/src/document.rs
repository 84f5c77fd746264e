#![forbid(unsafe_code)]

//! Element arena with id lookup, attributes, classes, and the document
//! focus engine.
//!
//! # Invariants
//!
//! 1. **Single focus position**: at most one element holds document focus.
//!    When focus sits inside an encapsulated scope, the document-level
//!    active element is the outermost host and each crossed scope records
//!    its own inner active element; [`Document::active_leaf`] resolves the
//!    chain to the true leaf.
//!
//! 2. **Focus requires participation**: a focus attempt succeeds only for
//!    an attached, focusable element with no `display: none` ancestor.
//!    A refused attempt leaves the current focus untouched — callers probe
//!    focusability by attempting focus and checking whether it moved.
//!
//! 3. **Focus notifications are queued, not re-entrant**: every actual
//!    focus move pushes one [`Event::FocusIn`] onto the document queue.
//!    The host drains the queue between turns with
//!    [`Document::drain_events`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Focus on detached node | Node removed earlier | `focus` returns `false`, no event |
//! | Focus on hidden subtree | `display: none` ancestor | `focus` returns `false`, no event |
//! | `get_element_by_id` on detached node | Subtree removed | Returns `None` |
//! | Duplicate id | Host assigned twice | Last write wins |
//! | Removing the focused subtree | Structural edit | Document focus cleared |

use ahash::{AHashMap, AHashSet};

use crate::event::Event;

/// Handle to an element in a [`Document`] arena.
///
/// Ids are minted by the owning document and stay valid for its lifetime;
/// a removed element keeps its id but stops being attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Raw index value, for diagnostics.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Encapsulated ("shadow") focus scope attached to a host element.
#[derive(Debug, Clone)]
struct ShadowScope {
    /// The scope's content container; parented to the host but not part of
    /// the host's ordinary child list.
    root: NodeId,
    /// The scope's own active element, when focus sits inside it.
    active: Option<NodeId>,
    /// The scope's designated first-focus element, if the component
    /// exposes one.
    first_focus: Option<NodeId>,
}

impl ShadowScope {
    fn new(root: NodeId) -> Self {
        Self {
            root,
            active: None,
            first_focus: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    id: Option<String>,
    attrs: AHashMap<String, String>,
    classes: AHashSet<String>,
    /// Inline display value; `None` means the stylesheet default (visible).
    display: Option<String>,
    focusable: bool,
    shadow: Option<ShadowScope>,
    /// Set on scope roots: the host element owning the scope.
    shadow_root_of: Option<NodeId>,
}

/// The host document: element tree, focus position, and scroll lock.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    active: Option<NodeId>,
    ids: AHashMap<String, NodeId>,
    scroll_locked: bool,
    queued: Vec<Event>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only the root ("body") element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            active: None,
            ids: AHashMap::new(),
            scroll_locked: false,
            queued: Vec::new(),
        };
        doc.root = doc.alloc("body");
        doc
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        });
        id
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0 as usize]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.0 as usize]
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    /// Element tag name.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> &str {
        &self.data(node).tag
    }

    // --- Tree structure ---

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first. Appending an element under its own
    /// descendant is refused.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_inclusive_ancestor(child, parent) {
            return;
        }
        self.unlink(child);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(parent).children.push(child);
    }

    /// Remove `node` from its parent. The subtree stays addressable by
    /// [`NodeId`] but is no longer attached, so it cannot be focused or
    /// found by id.
    pub fn remove(&mut self, node: NodeId) {
        self.unlink(node);
        self.clear_stale_focus();
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.data(node).parent {
            let siblings = &mut self.data_mut(parent).children;
            siblings.retain(|&c| c != node);
            self.data_mut(node).parent = None;
        }
    }

    /// Direct children, in tree order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    /// Parent element, if any. Scope roots report their host.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    /// Whether `node` is connected to the document root, crossing shadow
    /// scope boundaries.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root {
                return true;
            }
            match self.data(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.data(n).parent;
        }
        false
    }

    // --- Ids, attributes, classes ---

    /// Assign an element id, replacing any previous assignment for the
    /// same string (last write wins).
    pub fn set_element_id(&mut self, node: NodeId, id: &str) {
        if let Some(old) = self.data(node).id.clone() {
            self.ids.remove(&old);
        }
        self.data_mut(node).id = Some(id.to_string());
        self.ids.insert(id.to_string(), node);
    }

    /// Look up an attached element by id.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids
            .get(id)
            .copied()
            .filter(|&node| self.is_attached(node))
    }

    /// Set an attribute value.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.data_mut(node)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Read an attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.data(node).attrs.get(name).map(String::as_str)
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.data_mut(node).attrs.remove(name);
    }

    /// Whether the attribute is present (with any value).
    #[must_use]
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.data(node).attrs.contains_key(name)
    }

    /// Add a class name.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.data_mut(node).classes.insert(class.to_string());
    }

    /// Remove a class name.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.data_mut(node).classes.remove(class);
    }

    /// Whether the class is present.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.data(node).classes.contains(class)
    }

    // --- Display and scroll lock ---

    /// Set the inline display value; `None` restores the stylesheet
    /// default.
    pub fn set_display(&mut self, node: NodeId, display: Option<&str>) {
        self.data_mut(node).display = display.map(str::to_string);
    }

    /// Inline display value, if set.
    #[must_use]
    pub fn display(&self, node: NodeId) -> Option<&str> {
        self.data(node).display.as_deref()
    }

    fn hidden_by_display(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.data(n).display.as_deref() == Some("none") {
                return true;
            }
            cur = self.data(n).parent;
        }
        false
    }

    /// Lock or unlock body scrolling. Process-wide, last writer wins.
    pub fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    /// Whether body scrolling is locked.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    // --- Shadow scopes ---

    /// Attach an encapsulated focus scope to `host`, returning the scope's
    /// content root. Idempotent: a host keeps its first scope.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(scope) = &self.data(host).shadow {
            return scope.root;
        }
        let root = self.alloc("shadow-root");
        self.data_mut(root).parent = Some(host);
        self.data_mut(root).shadow_root_of = Some(host);
        self.data_mut(host).shadow = Some(ShadowScope::new(root));
        root
    }

    /// The scope content root for `host`, if a scope is attached.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.data(host).shadow.as_ref().map(|s| s.root)
    }

    /// Designate the scope's first-focus element.
    pub fn set_shadow_first_focus(&mut self, host: NodeId, node: Option<NodeId>) {
        if let Some(scope) = &mut self.data_mut(host).shadow {
            scope.first_focus = node;
        }
    }

    /// The scope's designated first-focus element.
    #[must_use]
    pub fn shadow_first_focus(&self, host: NodeId) -> Option<NodeId> {
        self.data(host).shadow.as_ref().and_then(|s| s.first_focus)
    }

    // --- Focus engine ---

    /// Mark an element as able to receive focus.
    pub fn set_focusable(&mut self, node: NodeId, focusable: bool) {
        self.data_mut(node).focusable = focusable;
    }

    /// Whether the element is marked focusable (ignoring attachment and
    /// visibility).
    #[must_use]
    pub fn is_focusable(&self, node: NodeId) -> bool {
        self.data(node).focusable
    }

    /// Attempt to move document focus to `node`.
    ///
    /// Returns `true` when `node` holds focus afterwards. A refused
    /// attempt (detached, not focusable, or hidden) returns `false` and
    /// leaves focus where it was. An actual move queues one
    /// [`Event::FocusIn`]; re-focusing the current leaf does not.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.data(node).focusable
            || !self.is_attached(node)
            || self.hidden_by_display(node)
        {
            return false;
        }
        if self.active_leaf() == Some(node) {
            return true;
        }

        self.clear_scope_chain();

        let hosts = self.shadow_host_chain(node);
        self.active = Some(hosts.first().copied().unwrap_or(node));
        for (i, &host) in hosts.iter().enumerate() {
            let inner = hosts.get(i + 1).copied().unwrap_or(node);
            if let Some(scope) = &mut self.data_mut(host).shadow {
                scope.active = Some(inner);
            }
        }

        self.queued.push(Event::FocusIn { target: node });
        true
    }

    /// Drop document focus entirely.
    pub fn blur(&mut self) {
        self.clear_scope_chain();
        self.active = None;
    }

    /// The document-level active element (an encapsulating host when focus
    /// sits inside a scope).
    #[must_use]
    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// The true focused element, resolved recursively through
    /// encapsulated scopes.
    #[must_use]
    pub fn active_leaf(&self) -> Option<NodeId> {
        let mut cur = self.active?;
        while let Some(inner) = self.data(cur).shadow.as_ref().and_then(|s| s.active) {
            cur = inner;
        }
        Some(cur)
    }

    /// Hosts of every scope crossed between the document root and `node`,
    /// outermost first. Empty when `node` is in the plain tree.
    fn shadow_host_chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut hosts = Vec::new();
        let mut cur = node;
        loop {
            let data = self.data(cur);
            if let Some(host) = data.shadow_root_of {
                hosts.push(host);
                cur = host;
            } else if let Some(parent) = data.parent {
                cur = parent;
            } else {
                break;
            }
        }
        hosts.reverse();
        hosts
    }

    fn clear_scope_chain(&mut self) {
        let mut cur = self.active;
        while let Some(host) = cur {
            cur = self.data(host).shadow.as_ref().and_then(|s| s.active);
            if let Some(scope) = &mut self.data_mut(host).shadow {
                scope.active = None;
            }
        }
    }

    fn clear_stale_focus(&mut self) {
        if let Some(leaf) = self.active_leaf()
            && !self.is_attached(leaf)
        {
            self.blur();
        }
    }

    // --- Event queue ---

    /// Take the focus notifications queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.queued)
    }
}
