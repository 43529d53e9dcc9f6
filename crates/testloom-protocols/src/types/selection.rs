//! Selection session types.
//!
//! A selection is an ordered, de-duplicated sequence of serialized page
//! elements. Identity is structural (by serialized markup), never by live node
//! reference - a live reference cannot cross a context boundary.

use serde::{Deserialize, Serialize};

/// Identifier of one live page (tab-like host context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u32);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Lifecycle state of a selection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Inspecting,
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Immutable serialized representation of one selected element at click time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Serialized markup of the element.
    pub html: String,
}

impl ElementSnapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

/// Ordered sequence of selected elements, de-duplicated by structural identity.
///
/// Invariant: no two snapshots with identical serialized content coexist.
/// Re-adding a previously removed element appends it at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub elements: Vec<ElementSnapshot>,
}

impl SelectionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle an element's membership. Returns `true` if the element was
    /// added, `false` if an existing structural twin was removed.
    pub fn toggle(&mut self, element: ElementSnapshot) -> bool {
        if let Some(pos) = self.elements.iter().position(|e| *e == element) {
            self.elements.remove(pos);
            false
        } else {
            self.elements.push(element);
            true
        }
    }

    /// Combined markup of all selected elements, in insertion order.
    pub fn combined(&self) -> String {
        self.elements
            .iter()
            .map(|e| e.html.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
