//! Panel-side channel manager.
//!
//! Presents a stable logical connection to one page's selection agent,
//! whatever happens to the channel underneath. Transient channel deaths
//! enter `Degraded` and drive an automatic fixed-interval reconnection
//! bounded by the retry budget; exhausting the budget surfaces exactly one
//! user-visible failure and settles in `Disconnected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use testloom_inspector::registry::{Installed, PageRegistry};
use testloom_protocols::channel::{DisconnectReason, PanelPort, channel};
use testloom_protocols::error::SessionError;
use testloom_protocols::message::{AgentEvent, AgentRequest, AgentResponse};
use testloom_protocols::types::{PageId, SelectionSnapshot};

const CHANNEL_CAPACITY: usize = 32;

/// Logical connection state presented to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
}

/// Events surfaced to the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    StateChanged(ConnectionState),
    SelectionChanged(SelectionSnapshot),
    /// The single user-visible failure for a lost connection.
    ConnectionFailed(String),
}

/// Result of a toggle round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectorStatus {
    pub is_active: bool,
    pub has_selection: bool,
}

/// Bounded reconnection policy: fixed-interval backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval: Duration::from_secs(1),
        }
    }
}

struct Inner {
    state: watch::Sender<ConnectionState>,
    port: RwLock<Option<PanelPort>>,
    page: RwLock<Option<PageId>>,
    events_tx: mpsc::UnboundedSender<ManagerEvent>,
    /// Bumped by `open` and `close`; monitors from an older epoch stand down.
    epoch: AtomicU64,
}

/// Panel-side manager for one session channel.
pub struct ChannelManager {
    registry: Arc<PageRegistry>,
    policy: RetryPolicy,
    inner: Arc<Inner>,
}

impl ChannelManager {
    pub fn new(
        registry: Arc<PageRegistry>,
        policy: RetryPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<ManagerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let manager = Self {
            registry,
            policy,
            inner: Arc::new(Inner {
                state,
                port: RwLock::new(None),
                page: RwLock::new(None),
                events_tx,
                epoch: AtomicU64::new(0),
            }),
        };
        (manager, events_rx)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Idempotently install the selection agent into the target page. An
    /// existing installation is tolerated; a real failure re-raises as
    /// [`SessionError::Installation`].
    pub async fn ensure_agent_present(&self, page: PageId) -> Result<Installed, SessionError> {
        self.registry
            .ensure_installed(page)
            .await
            .map_err(|err| SessionError::Installation(err.to_string()))
    }

    /// Open a session channel to `page` and start monitoring it.
    pub async fn open(&self, page: PageId) -> Result<(), SessionError> {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.page.write().await = Some(page);
        set_state(&self.inner, ConnectionState::Connecting);

        match establish(&self.inner, &self.registry, page).await {
            Ok(handles) => {
                set_state(&self.inner, ConnectionState::Connected);
                info!(%page, "session channel open");
                tokio::spawn(monitor(
                    self.inner.clone(),
                    self.registry.clone(),
                    self.policy,
                    page,
                    epoch,
                    handles,
                ));
                Ok(())
            }
            Err(err) => {
                set_state(&self.inner, ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Flip the agent's inspection flag; request/response over the channel.
    pub async fn toggle_inspection(&self) -> Result<InspectorStatus, SessionError> {
        let guard = self.inner.port.read().await;
        let port = guard.as_ref().ok_or(SessionError::NotConnected)?;
        match port
            .request(AgentRequest::ToggleInspector { reset: false })
            .await?
        {
            AgentResponse::InspectorState {
                is_active,
                has_selection,
            } => Ok(InspectorStatus {
                is_active,
                has_selection,
            }),
            other => Err(SessionError::SendFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    /// Drop the current selection on the page.
    pub async fn clear_selection(&self) -> Result<bool, SessionError> {
        match self.request_or_one_off(AgentRequest::ClearSelection).await? {
            AgentResponse::Ack { success } => Ok(success),
            other => Err(SessionError::SendFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    /// Read back the current selection snapshot.
    pub async fn get_selected_dom(&self) -> Result<SelectionSnapshot, SessionError> {
        match self.request_or_one_off(AgentRequest::GetSelectedDom).await? {
            AgentResponse::Selection { selection } => Ok(selection),
            other => Err(SessionError::SendFailed(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    /// Explicit teardown. Suppresses any pending reconnection attempts.
    pub async fn close(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(port) = self.inner.port.write().await.take() {
            port.close();
        }
        set_state(&self.inner, ConnectionState::Disconnected);
        info!("session channel closed");
    }

    /// Prefer the open channel; fall back to the one-off message path.
    async fn request_or_one_off(
        &self,
        request: AgentRequest,
    ) -> Result<AgentResponse, SessionError> {
        {
            let guard = self.inner.port.read().await;
            if let Some(port) = guard.as_ref() {
                match port.request(request.clone()).await {
                    Ok(resp) => return Ok(resp),
                    Err(err) => debug!(%err, "channel request failed, using one-off path"),
                }
            }
        }
        let page = { *self.inner.page.read().await }.ok_or(SessionError::NotConnected)?;
        self.registry.request(page, request).await
    }
}

struct ChannelHandles {
    events: mpsc::Receiver<AgentEvent>,
    closed: watch::Receiver<Option<DisconnectReason>>,
}

/// Build a fresh channel, attach the agent side, and store the panel port.
async fn establish(
    inner: &Arc<Inner>,
    registry: &Arc<PageRegistry>,
    page: PageId,
) -> Result<ChannelHandles, SessionError> {
    registry
        .ensure_installed(page)
        .await
        .map_err(|err| SessionError::Installation(err.to_string()))?;

    let (mut panel, agent_port) = channel(page, CHANNEL_CAPACITY);
    let events = panel.take_events().ok_or(SessionError::ChannelClosed)?;
    let closed = panel.watch_disconnect();
    registry.attach_channel(page, agent_port).await?;
    *inner.port.write().await = Some(panel);
    Ok(ChannelHandles { events, closed })
}

/// Drive one logical connection across channel deaths until it ends.
async fn monitor(
    inner: Arc<Inner>,
    registry: Arc<PageRegistry>,
    policy: RetryPolicy,
    page: PageId,
    epoch: u64,
    mut handles: ChannelHandles,
) {
    loop {
        let reason = pump(&inner, &mut handles).await;
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        let reason = reason.unwrap_or(DisconnectReason::PageClosed);

        match reason {
            DisconnectReason::Explicit => return,
            reason if !reason.is_transient() => {
                inner.port.write().await.take();
                set_state(&inner, ConnectionState::Disconnected);
                emit(
                    &inner,
                    ManagerEvent::ConnectionFailed(format!(
                        "connection lost: {}",
                        reason.describe()
                    )),
                );
                return;
            }
            reason => {
                warn!(%page, reason = reason.describe(), "channel lost, degraded");
                inner.port.write().await.take();
                set_state(&inner, ConnectionState::Degraded);
            }
        }

        let mut reconnected = None;
        for attempt in 1..=policy.attempts {
            sleep(policy.interval).await;
            if inner.epoch.load(Ordering::SeqCst) != epoch {
                return;
            }
            info!(%page, attempt, max = policy.attempts, "attempting to reconnect");
            match establish(&inner, &registry, page).await {
                Ok(handles) => {
                    reconnected = Some(handles);
                    break;
                }
                Err(err) => debug!(%page, %err, "reconnect attempt failed"),
            }
        }

        match reconnected {
            Some(next) => {
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    // A close or newer open raced the reconnect; stand down.
                    if let Some(port) = inner.port.write().await.take() {
                        port.close();
                    }
                    return;
                }
                set_state(&inner, ConnectionState::Connected);
                info!(%page, "reconnected");
                handles = next;
            }
            None => {
                set_state(&inner, ConnectionState::Disconnected);
                emit(
                    &inner,
                    ManagerEvent::ConnectionFailed(
                        "connection failed, please retry".to_string(),
                    ),
                );
                return;
            }
        }
    }
}

/// Forward agent events until the channel dies; return the recorded reason.
async fn pump(inner: &Arc<Inner>, handles: &mut ChannelHandles) -> Option<DisconnectReason> {
    loop {
        tokio::select! {
            event = handles.events.recv() => match event {
                Some(AgentEvent::SelectionChanged { selection }) => {
                    emit(inner, ManagerEvent::SelectionChanged(selection));
                }
                None => return *handles.closed.borrow(),
            },
            reason = wait_closed(&mut handles.closed) => return reason,
        }
    }
}

async fn wait_closed(
    rx: &mut watch::Receiver<Option<DisconnectReason>>,
) -> Option<DisconnectReason> {
    loop {
        if let Some(reason) = *rx.borrow_and_update() {
            return Some(reason);
        }
        if rx.changed().await.is_err() {
            return None;
        }
    }
}

fn set_state(inner: &Inner, state: ConnectionState) {
    let changed = inner.state.send_if_modified(|current| {
        if *current != state {
            *current = state;
            true
        } else {
            false
        }
    });
    if changed {
        emit(inner, ManagerEvent::StateChanged(state));
    }
}

fn emit(inner: &Inner, event: ManagerEvent) {
    // The panel may be gone; events are then dropped on the floor.
    let _ = inner.events_tx.send(event);
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
