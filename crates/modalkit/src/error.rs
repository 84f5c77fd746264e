#![forbid(unsafe_code)]

//! Error taxonomy for the dialog widget.
//!
//! Configuration and structural errors are fatal and surface as `Err` at
//! attach time (or the moment a corrupted render tree is touched); a
//! misconfigured dialog must fail loudly during integration rather than
//! render inert. Focus-probe failures and stale-reference restoration are
//! not errors at all — they are recovered silently where they occur.

use std::fmt;

/// Fatal dialog errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// Neither `aria-label` nor `aria-labelledby` was supplied.
    MissingAccessibleName,
    /// Both `aria-label` and `aria-labelledby` were supplied.
    ConflictingAccessibleName,
    /// The `role` attribute holds an unassignable value.
    InvalidRole(String),
    /// A required attribute is absent.
    MissingAttribute(&'static str),
    /// An id reference attribute names an element that does not exist.
    UnresolvedReference {
        attribute: &'static str,
        id: String,
    },
    /// Shadow delegation was requested but the content element has no
    /// encapsulated scope.
    MissingShadowRoot,
    /// The encapsulated scope must expose exactly one child node.
    AmbiguousShadowContent { children: usize },
    /// A structural part of the render tree (backdrop, sentinel,
    /// container) is gone at the moment it is needed.
    StructureMissing(&'static str),
}

impl fmt::Display for ModalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccessibleName => {
                write!(f, "aria-label or aria-labelledby must be included")
            }
            Self::ConflictingAccessibleName => {
                write!(f, "aria-label and aria-labelledby can include just one")
            }
            Self::InvalidRole(role) => write!(
                f,
                "role attribute is assigned an invalid value '{role}'; assignable values are dialog, alertdialog"
            ),
            Self::MissingAttribute(name) => write!(f, "{name} is not assigned"),
            Self::UnresolvedReference { attribute, id } => {
                write!(f, "{attribute} refers to '{id}' which could not be found")
            }
            Self::MissingShadowRoot => {
                write!(f, "shadow delegation requested but the content element has no shadow root")
            }
            Self::AmbiguousShadowContent { children } => write!(
                f,
                "shadow content root must expose exactly one child node, found {children}"
            ),
            Self::StructureMissing(part) => {
                write!(f, "dialog render tree is corrupted: {part} is missing")
            }
        }
    }
}

impl std::error::Error for ModalError {}
