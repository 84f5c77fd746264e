#![forbid(unsafe_code)]

//! Declarative attribute resolution.
//!
//! The resolver reads the host element's attributes once, at attach time,
//! and produces a validated [`ModalOptions`]. Reference attributes (`node`,
//! `first-focus`, `app`) are resolved against the document immediately:
//! a reference that is present but does not resolve is a fatal error, an
//! absent optional reference is not.
//!
//! Boolean attributes follow the host convention of carrying the literal
//! value `"true"`; any other value (or absence) reads as false. A
//! non-numeric `duration` silently falls back to the default.

use std::time::Duration;

use modalkit_dom::{Document, NodeId};

use crate::error::ModalError;

/// Default enter/exit transition length.
pub const DEFAULT_ANIMATION_MS: u64 = 300;

/// Accessibility role of the dialog container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DialogRole {
    #[default]
    Dialog,
    AlertDialog,
}

impl DialogRole {
    /// The attribute value stamped on the container.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::AlertDialog => "alertdialog",
        }
    }

    fn parse(value: &str) -> Result<Self, ModalError> {
        match value {
            "dialog" => Ok(Self::Dialog),
            "alertdialog" => Ok(Self::AlertDialog),
            other => Err(ModalError::InvalidRole(other.to_string())),
        }
    }
}

/// The accessible-name source: exactly one of an inline label or a
/// reference to a labelling element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessibleName {
    /// `aria-label`: inline name text.
    Label(String),
    /// `aria-labelledby`: id of the labelling element.
    LabelledBy(String),
}

/// Enter/exit animation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationOptions {
    /// Whether settle actions wait for transition completion.
    pub enabled: bool,
    /// Expected transition length.
    pub duration: Duration,
    /// Class present for the whole open period; carries the transition.
    pub enter_class: String,
    /// Class added once the open transition settles.
    pub active_class: String,
    /// Class added while the close transition runs.
    pub exit_class: String,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            duration: Duration::from_millis(DEFAULT_ANIMATION_MS),
            enter_class: "fade".to_string(),
            active_class: "active".to_string(),
            exit_class: "hide".to_string(),
        }
    }
}

/// Validated dialog configuration, resolved once at attach time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModalOptions {
    pub role: DialogRole,
    pub name: AccessibleName,
    /// `aria-describedby` id, passed through unvalidated.
    pub described_by: Option<String>,
    /// The element whose descendants are focus-trapped.
    pub content: NodeId,
    /// Explicit first-focus target, when configured.
    pub first_focus: Option<NodeId>,
    /// Background root receiving `aria-hidden` while open.
    pub app_root: Option<NodeId>,
    pub animation: AnimationOptions,
    /// Suppresses Escape and backdrop-click dismissal.
    pub disabled: bool,
    /// Content delegates one level into its encapsulated scope.
    pub shadow: bool,
    /// Backdrop display value while open; closed is always `"none"`.
    pub display: String,
}

/// Read and validate the host element's attributes.
pub fn resolve(doc: &Document, host: NodeId) -> Result<ModalOptions, ModalError> {
    let name = resolve_accessible_name(doc, host)?;
    let described_by = doc.attribute(host, "aria-describedby").map(str::to_string);

    let role = match doc.attribute(host, "role") {
        Some(value) => DialogRole::parse(value)?,
        None => DialogRole::default(),
    };

    let content = resolve_reference(doc, host, "node")?
        .ok_or(ModalError::MissingAttribute("node"))?;
    let first_focus = resolve_reference(doc, host, "first-focus")?;
    let app_root = resolve_reference(doc, host, "app")?;

    let animation = AnimationOptions {
        enabled: flag(doc, host, "animation"),
        duration: duration_attr(doc, host),
        enter_class: class_attr(doc, host, "fade"),
        active_class: class_attr(doc, host, "active"),
        exit_class: class_attr(doc, host, "hide"),
    };

    Ok(ModalOptions {
        role,
        name,
        described_by,
        content,
        first_focus,
        app_root,
        animation,
        disabled: flag(doc, host, "disabled"),
        shadow: flag(doc, host, "shadow"),
        display: doc
            .attribute(host, "display")
            .unwrap_or("block")
            .to_string(),
    })
}

fn resolve_accessible_name(doc: &Document, host: NodeId) -> Result<AccessibleName, ModalError> {
    let label = doc.attribute(host, "aria-label");
    let labelled_by = doc.attribute(host, "aria-labelledby");
    match (label, labelled_by) {
        (Some(text), None) => Ok(AccessibleName::Label(text.to_string())),
        (None, Some(id)) => Ok(AccessibleName::LabelledBy(id.to_string())),
        (None, None) => Err(ModalError::MissingAccessibleName),
        (Some(_), Some(_)) => Err(ModalError::ConflictingAccessibleName),
    }
}

/// Resolve an id-reference attribute. Absent is `Ok(None)`; present but
/// unresolvable is fatal.
fn resolve_reference(
    doc: &Document,
    host: NodeId,
    attribute: &'static str,
) -> Result<Option<NodeId>, ModalError> {
    match doc.attribute(host, attribute) {
        None => Ok(None),
        Some(id) => doc
            .get_element_by_id(id)
            .map(Some)
            .ok_or_else(|| ModalError::UnresolvedReference {
                attribute,
                id: id.to_string(),
            }),
    }
}

fn flag(doc: &Document, host: NodeId, name: &str) -> bool {
    doc.attribute(host, name) == Some("true")
}

fn duration_attr(doc: &Document, host: NodeId) -> Duration {
    let millis = doc
        .attribute(host, "duration")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_ANIMATION_MS);
    Duration::from_millis(millis)
}

fn class_attr(doc: &Document, host: NodeId, name: &str) -> String {
    doc.attribute(host, name).unwrap_or(name).to_string()
}
