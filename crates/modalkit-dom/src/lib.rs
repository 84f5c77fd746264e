#![forbid(unsafe_code)]

//! Retained host-document model for ModalKit.
//!
//! This crate is the "host document" collaborator consumed by the dialog
//! widget: an element arena with id lookup, attribute and class storage,
//! display toggling, a body scroll lock, and the single document focus
//! position — including recursive resolution through encapsulated
//! ("shadow") focus scopes. It also defines the typed UI event stream
//! (key / click / focus / transition-end) that widgets consume.
//!
//! The model carries no widget logic of its own. Widgets mutate it and
//! react to events routed by the host loop.

pub mod document;
pub mod event;

pub use document::{Document, NodeId};
pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton};
