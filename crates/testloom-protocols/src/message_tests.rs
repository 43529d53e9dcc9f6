use super::*;
use crate::types::ElementSnapshot;

#[test]
fn test_toggle_inspector_tag() {
    let msg = AgentRequest::ToggleInspector { reset: true };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "toggle_inspector");
    assert_eq!(json["reset"], true);
}

#[test]
fn test_request_roundtrip_all_variants() {
    let requests = vec![
        AgentRequest::ToggleInspector { reset: false },
        AgentRequest::ClearSelection,
        AgentRequest::Cleanup,
        AgentRequest::GetSelectedDom,
    ];
    for req in requests {
        let json = serde_json::to_string(&req).unwrap();
        let back: AgentRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}

#[test]
fn test_inspector_state_response() {
    let resp = AgentResponse::InspectorState {
        is_active: true,
        has_selection: false,
    };
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["type"], "inspector_state");
    assert_eq!(json["is_active"], true);
    assert_eq!(json["has_selection"], false);
}

#[test]
fn test_selection_changed_event_carries_snapshot() {
    let mut selection = SelectionSnapshot::new();
    selection.toggle(ElementSnapshot::new("<input>"));
    let event = AgentEvent::SelectionChanged {
        selection: selection.clone(),
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: AgentEvent = serde_json::from_str(&json).unwrap();
    let AgentEvent::SelectionChanged { selection: got } = back;
    assert_eq!(got, selection);
}
