//! Selection agent state machine.
//!
//! One agent exists per instrumented page. While inspecting it highlights the
//! node under the pointer and, on click, toggles that node's membership in
//! the session selection by structural identity. Side effects on the page are
//! visual only (class changes); nothing else is mutated.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use testloom_protocols::message::{AgentRequest, AgentResponse};
use testloom_protocols::page::{NodeHandle, SelectionSink};
use testloom_protocols::types::{ElementSnapshot, PageId, SelectionSnapshot, SessionState};

/// Class applied to the node currently under the pointer.
pub const HIGHLIGHT_CLASS: &str = "testloom-highlight";
/// Class applied to every selected node.
pub const SELECTED_CLASS: &str = "testloom-selected";

/// Pointer signals from the page's visual tree.
#[derive(Clone)]
pub enum PointerEvent {
    Over(NodeHandle),
    Out,
    Click(NodeHandle),
}

struct SelectedEntry {
    /// Markup captured at click time; the element's structural identity.
    html: String,
    node: NodeHandle,
}

/// Per-page selection session and its state machine.
pub struct SelectionAgent {
    session_id: Uuid,
    page: PageId,
    state: SessionState,
    selected: Vec<SelectedEntry>,
    highlighted: Option<NodeHandle>,
    sink: Arc<dyn SelectionSink>,
}

impl SelectionAgent {
    pub fn new(page: PageId, sink: Arc<dyn SelectionSink>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            page,
            state: SessionState::Idle,
            selected: Vec::new(),
            highlighted: None,
            sink,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Current selection, in insertion order.
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            elements: self
                .selected
                .iter()
                .map(|e| ElementSnapshot::new(e.html.clone()))
                .collect(),
        }
    }

    /// Begin inspecting. Idempotent when already inspecting.
    pub fn start(&mut self) {
        if self.state == SessionState::Inspecting {
            return;
        }
        self.state = SessionState::Inspecting;
        debug!(page = %self.page, "inspection started");
    }

    /// Stop inspecting and drop the transient highlight. The selection is
    /// kept.
    pub fn stop(&mut self) {
        self.state = SessionState::Stopped;
        self.clear_highlight();
        debug!(page = %self.page, "inspection stopped");
    }

    /// Handle one pointer signal. Returns the new selection snapshot when a
    /// click toggled it, so the caller can forward it over the attached
    /// channel. The click's default page action is suppressed exactly when a
    /// snapshot is returned.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<SelectionSnapshot> {
        if self.state != SessionState::Inspecting {
            return None;
        }
        match event {
            PointerEvent::Over(node) => {
                self.clear_highlight();
                node.add_class(HIGHLIGHT_CLASS);
                self.highlighted = Some(node);
                None
            }
            PointerEvent::Out => {
                self.clear_highlight();
                None
            }
            PointerEvent::Click(node) => Some(self.toggle_node(node)),
        }
    }

    fn toggle_node(&mut self, node: NodeHandle) -> SelectionSnapshot {
        let html = node.outer_html();
        if let Some(pos) = self.selected.iter().position(|e| e.html == html) {
            let entry = self.selected.remove(pos);
            entry.node.remove_class(SELECTED_CLASS);
        } else {
            node.add_class(SELECTED_CLASS);
            self.selected.push(SelectedEntry { html, node });
        }

        let snapshot = self.snapshot();
        // Crash-recovery copy for the relay; failure is swallowed, not retried.
        self.sink.publish(self.page, snapshot.clone());
        snapshot
    }

    /// Flip the inspection flag and report the resulting state. `reset`
    /// clears the current selection before a fresh inspection starts.
    pub fn toggle_inspector(&mut self, reset: bool) -> (bool, bool) {
        if self.state != SessionState::Inspecting {
            if reset {
                self.clear_selection();
            }
            self.start();
        } else {
            self.stop();
        }
        (self.state == SessionState::Inspecting, self.has_selection())
    }

    /// Drop the selection and its classes from still-attached nodes.
    pub fn clear_selection(&mut self) {
        for entry in self.selected.drain(..) {
            if entry.node.is_attached() {
                entry.node.remove_class(SELECTED_CLASS);
                entry.node.remove_class(HIGHLIGHT_CLASS);
            }
        }
        self.clear_highlight();
    }

    /// Clear the selection and return to `Idle`.
    pub fn reset(&mut self) {
        self.clear_selection();
        self.state = SessionState::Idle;
        debug!(page = %self.page, "session reset");
    }

    /// Full teardown: stop inspecting, then reset.
    pub fn cleanup(&mut self) {
        self.stop();
        self.reset();
    }

    /// Serve one request from the cross-context message set.
    pub fn dispatch(&mut self, request: AgentRequest) -> AgentResponse {
        match request {
            AgentRequest::ToggleInspector { reset } => {
                let (is_active, has_selection) = self.toggle_inspector(reset);
                AgentResponse::InspectorState {
                    is_active,
                    has_selection,
                }
            }
            AgentRequest::ClearSelection => {
                self.clear_selection();
                AgentResponse::Ack { success: true }
            }
            AgentRequest::Cleanup => {
                self.cleanup();
                AgentResponse::Ack { success: true }
            }
            AgentRequest::GetSelectedDom => AgentResponse::Selection {
                selection: self.snapshot(),
            },
        }
    }

    fn clear_highlight(&mut self) {
        if let Some(node) = self.highlighted.take() {
            node.remove_class(HIGHLIGHT_CLASS);
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
