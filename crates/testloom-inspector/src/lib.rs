//! # testloom Inspector
//!
//! The page-embedded side of an inspection session: the [`SelectionAgent`]
//! state machine that tracks hover and click-toggle selection over a live
//! page, and the [`PageRegistry`] that owns one agent event loop per page
//! with an idempotent install contract.

pub mod agent;
pub mod registry;

pub use agent::{HIGHLIGHT_CLASS, PointerEvent, SELECTED_CLASS, SelectionAgent};
pub use registry::{Installed, PageRegistry};
