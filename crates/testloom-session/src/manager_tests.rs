use std::sync::Arc;
use std::time::Duration;

use super::*;
use testloom_inspector::agent::PointerEvent;
use testloom_protocols::page::{PageNode, SelectionSink};

struct FakeNode {
    html: String,
}

impl FakeNode {
    fn new(html: &str) -> Arc<Self> {
        Arc::new(Self {
            html: html.to_string(),
        })
    }
}

impl PageNode for FakeNode {
    fn outer_html(&self) -> String {
        self.html.clone()
    }

    fn add_class(&self, _class: &str) {}

    fn remove_class(&self, _class: &str) {}
}

#[derive(Default)]
struct NullSink;

impl SelectionSink for NullSink {
    fn publish(&self, _page: PageId, _selection: SelectionSnapshot) {}
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        interval: Duration::from_millis(20),
    }
}

fn setup() -> (
    Arc<PageRegistry>,
    ChannelManager,
    tokio::sync::mpsc::UnboundedReceiver<ManagerEvent>,
) {
    let registry = PageRegistry::new(Arc::new(NullSink));
    let (manager, events) = ChannelManager::new(registry.clone(), fast_policy());
    (registry, manager, events)
}

async fn wait_for_state(manager: &ChannelManager, want: ConnectionState) {
    let mut rx = manager.watch_state();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if *rx.borrow_and_update() == want {
                return;
            }
            rx.changed().await.expect("state watch closed");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("state {want:?} not reached"));
}

fn drain(events: &mut tokio::sync::mpsc::UnboundedReceiver<ManagerEvent>) -> Vec<ManagerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn failure_count(events: &[ManagerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ManagerEvent::ConnectionFailed(_)))
        .count()
}

#[tokio::test]
async fn test_open_reaches_connected() {
    let (_registry, manager, mut events) = setup();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    manager.open(PageId(1)).await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);

    let seen = drain(&mut events);
    assert!(seen.contains(&ManagerEvent::StateChanged(ConnectionState::Connecting)));
    assert!(seen.contains(&ManagerEvent::StateChanged(ConnectionState::Connected)));
}

#[tokio::test]
async fn test_ensure_agent_present_tolerates_existing() {
    let (_registry, manager, _events) = setup();
    assert_eq!(
        manager.ensure_agent_present(PageId(1)).await.unwrap(),
        Installed::New
    );
    assert_eq!(
        manager.ensure_agent_present(PageId(1)).await.unwrap(),
        Installed::Existing
    );
}

#[tokio::test]
async fn test_toggle_round_trip_restores_state() {
    let (_registry, manager, _events) = setup();
    manager.open(PageId(1)).await.unwrap();

    let first = manager.toggle_inspection().await.unwrap();
    assert!(first.is_active);
    let second = manager.toggle_inspection().await.unwrap();
    assert!(!second.is_active);
    assert!(!second.has_selection);
}

#[tokio::test]
async fn test_toggle_without_open_fails() {
    let (_registry, manager, _events) = setup();
    let err = manager.toggle_inspection().await.unwrap_err();
    assert!(matches!(err, SessionError::NotConnected));
}

#[tokio::test]
async fn test_selection_events_surface_to_panel() {
    let (registry, manager, mut events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();
    manager.toggle_inspection().await.unwrap();

    registry
        .pointer(page, PointerEvent::Click(FakeNode::new("<a/>")))
        .await
        .unwrap();

    let selection = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match events.recv().await.expect("events closed") {
                ManagerEvent::SelectionChanged(selection) => return selection,
                _ => continue,
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(selection.combined(), "<a/>");
}

#[tokio::test]
async fn test_transient_disconnect_reconnects_within_budget() {
    let (registry, manager, mut events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();

    registry.frozen(page).await.unwrap();
    wait_for_state(&manager, ConnectionState::Degraded).await;

    // Let one attempt fail against the frozen page, then resume.
    tokio::time::sleep(Duration::from_millis(30)).await;
    registry.resumed(page).await.unwrap();

    wait_for_state(&manager, ConnectionState::Connected).await;

    let seen = drain(&mut events);
    assert_eq!(failure_count(&seen), 0);

    // The fresh channel works.
    let status = manager.toggle_inspection().await.unwrap();
    assert!(status.is_active);
}

#[tokio::test]
async fn test_budget_exhaustion_surfaces_single_failure() {
    let (registry, manager, mut events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();

    registry.frozen(page).await.unwrap();
    wait_for_state(&manager, ConnectionState::Disconnected).await;

    // Give the monitor a beat to emit its final event.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let seen = drain(&mut events);
    assert_eq!(failure_count(&seen), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_close_suppresses_pending_reconnection() {
    let (registry, manager, mut events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();

    registry.frozen(page).await.unwrap();
    wait_for_state(&manager, ConnectionState::Degraded).await;
    manager.close().await;

    // Even after the page thaws, nothing reconnects.
    registry.resumed(page).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(manager.state(), ConnectionState::Disconnected);
    let seen = drain(&mut events);
    assert_eq!(failure_count(&seen), 0);
}

#[tokio::test]
async fn test_one_off_path_when_channel_down() {
    let (registry, manager, _events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();
    manager.toggle_inspection().await.unwrap();
    registry
        .pointer(page, PointerEvent::Click(FakeNode::new("<p>x</p>")))
        .await
        .unwrap();

    manager.close().await;

    // With the channel gone, reads fall back to the one-off message path.
    let selection = manager.get_selected_dom().await.unwrap();
    assert_eq!(selection.combined(), "<p>x</p>");
    assert!(manager.clear_selection().await.unwrap());
    assert!(manager.get_selected_dom().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_page_close_surfaces_permanent_failure() {
    let (registry, manager, mut events) = setup();
    let page = PageId(1);
    manager.open(page).await.unwrap();

    registry.page_closed(page).await;
    wait_for_state(&manager, ConnectionState::Disconnected).await;

    tokio::time::sleep(Duration::from_millis(10)).await;
    let seen = drain(&mut events);
    assert_eq!(failure_count(&seen), 1);
}
