#![forbid(unsafe_code)]

//! Accessible modal dialog with a recoverable focus trap.
//!
//! A [`ModalDialog`] attaches to a host element in a [`Document`], builds
//! a backdrop with wrap sentinels around a role-carrying container, and
//! traps keyboard focus inside the configured content element while
//! open. Focus is captured once per open and restored once per close,
//! tolerating restore targets that have left the tree in between.
//! Opening and closing optionally gate on a CSS transition; a lost
//! transition signal is recoverable through
//! [`ModalDialog::settle_overdue`].
//!
//! ```
//! use modalkit::ModalDialog;
//! use modalkit_dom::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let content = doc.create_element("div");
//! doc.set_element_id(content, "content");
//! doc.append_child(root, content);
//!
//! let host = doc.create_element("modal-dialog");
//! doc.append_child(root, host);
//! doc.set_attribute(host, "aria-label", "Settings");
//! doc.set_attribute(host, "node", "content");
//!
//! let mut dialog = ModalDialog::attach(&mut doc, host)?;
//! dialog.set_open(&mut doc, true)?;
//! assert!(dialog.is_open());
//! # Ok::<(), modalkit::ModalError>(())
//! ```

pub mod boundary;
pub mod config;
pub mod dialog;
pub mod error;
pub mod lifecycle;
pub mod trap;

pub use config::{
    AccessibleName, AnimationOptions, DialogRole, ModalOptions, DEFAULT_ANIMATION_MS,
};
pub use dialog::{ModalAction, ModalDialog};
pub use error::ModalError;
pub use lifecycle::{LifecycleController, ModalAnimation, ModalParts};
pub use trap::{FocusTrap, TrapPhase};

pub use modalkit_dom::Document;
