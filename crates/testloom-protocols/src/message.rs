//! Cross-context message set.
//!
//! The finite message vocabulary between a panel and a page's selection agent,
//! expressed as tagged unions so a new message kind is a compile-time-checked
//! addition rather than a stray string tag.

use serde::{Deserialize, Serialize};

use crate::types::SelectionSnapshot;

/// Request from the panel side to a page's selection agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentRequest {
    /// Flip the inspection flag. `reset` clears the current selection before
    /// starting a fresh inspection.
    ToggleInspector { reset: bool },
    /// Drop all selected elements and their highlight classes.
    ClearSelection,
    /// Full teardown: stop inspecting and clear the selection.
    Cleanup,
    /// Read back the current selection snapshot.
    GetSelectedDom,
}

/// Response from a selection agent to the panel side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentResponse {
    /// Result of a toggle: the inspection flag and whether anything is selected.
    InspectorState { is_active: bool, has_selection: bool },
    /// Plain acknowledgment for clear/cleanup.
    Ack { success: bool },
    /// The current selection.
    Selection { selection: SelectionSnapshot },
}

/// Unsolicited event pushed from a selection agent over an open channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The selection changed after a click toggle.
    SelectionChanged { selection: SelectionSnapshot },
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
