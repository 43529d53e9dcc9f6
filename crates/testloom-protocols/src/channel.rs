//! Session channel between a panel and a page's selection agent.
//!
//! A channel is a bidirectional, ordered, at-most-once-per-send message path
//! scoped to one page. Its lifetime is independent of both endpoints' logical
//! lifetimes: it can die underneath either side (navigation, page freeze,
//! page teardown) without synchronous notice. The panel side observes death
//! through the shared disconnect register and owns the reconnection policy;
//! the agent side only serves requests and pushes events.
//!
//! Messages sent on one channel instance are delivered in send order. A
//! reconnect produces a new instance and a fresh ordering domain.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::SessionError;
use crate::message::{AgentEvent, AgentRequest, AgentResponse};
use crate::types::PageId;

/// Why a channel died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The page was frozen or moved into a history cache. The page (and its
    /// agent) still exists.
    Frozen,
    /// The page navigated to a new document.
    Navigated,
    /// The page was destroyed.
    PageClosed,
    /// One side closed the channel deliberately.
    Explicit,
}

impl DisconnectReason {
    /// Transient deaths drive the bounded reconnection policy; permanent
    /// ones surface immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Frozen | Self::Navigated)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Frozen => "page frozen",
            Self::Navigated => "page navigated",
            Self::PageClosed => "page closed",
            Self::Explicit => "closed",
        }
    }
}

/// One request in flight on a channel, with its reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub request: AgentRequest,
    pub reply: oneshot::Sender<AgentResponse>,
}

/// Create a connected channel for `page`.
pub fn channel(page: PageId, capacity: usize) -> (PanelPort, AgentPort) {
    let (req_tx, req_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (closed_tx, closed_rx) = watch::channel(None);
    let closed_tx = Arc::new(closed_tx);

    let panel = PanelPort {
        page,
        requests: req_tx,
        events: Some(event_rx),
        closed_tx: closed_tx.clone(),
        closed_rx: closed_rx.clone(),
    };
    let agent = AgentPort {
        requests: req_rx,
        events: event_tx,
        closed_tx,
        closed_rx,
    };
    (panel, agent)
}

/// Panel-side endpoint.
pub struct PanelPort {
    page: PageId,
    requests: mpsc::Sender<Envelope>,
    events: Option<mpsc::Receiver<AgentEvent>>,
    closed_tx: Arc<watch::Sender<Option<DisconnectReason>>>,
    closed_rx: watch::Receiver<Option<DisconnectReason>>,
}

impl PanelPort {
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Send a request and wait for the agent's response.
    pub async fn request(&self, request: AgentRequest) -> Result<AgentResponse, SessionError> {
        if let Some(reason) = self.disconnect_reason() {
            return Err(SessionError::ChannelLost {
                reason: reason.describe().to_string(),
                transient: reason.is_transient(),
            });
        }

        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Envelope { request, reply: tx })
            .await
            .map_err(|_| SessionError::ChannelLost {
                reason: "agent endpoint gone".to_string(),
                transient: false,
            })?;
        rx.await.map_err(|_| SessionError::ChannelLost {
            reason: "reply dropped".to_string(),
            transient: false,
        })
    }

    /// Take the event stream. Yields agent-pushed events in send order;
    /// callable once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<AgentEvent>> {
        self.events.take()
    }

    /// A watch over the disconnect register for monitor tasks.
    pub fn watch_disconnect(&self) -> watch::Receiver<Option<DisconnectReason>> {
        self.closed_rx.clone()
    }

    /// The recorded disconnect reason, if the channel has died.
    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        *self.closed_rx.borrow()
    }

    /// Close the channel deliberately. The first recorded reason wins.
    pub fn close(&self) {
        record_close(&self.closed_tx, DisconnectReason::Explicit);
    }
}

/// Agent-side endpoint.
pub struct AgentPort {
    requests: mpsc::Receiver<Envelope>,
    events: mpsc::Sender<AgentEvent>,
    closed_tx: Arc<watch::Sender<Option<DisconnectReason>>>,
    closed_rx: watch::Receiver<Option<DisconnectReason>>,
}

impl AgentPort {
    /// Receive the next request. Returns `None` once the channel is closed
    /// or the panel endpoint is gone.
    pub async fn next_request(&mut self) -> Option<Envelope> {
        let mut closed = self.closed_rx.clone();
        loop {
            if closed.borrow_and_update().is_some() {
                return None;
            }
            tokio::select! {
                env = self.requests.recv() => return env,
                res = closed.changed() => {
                    if res.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// Push an event to the panel side.
    pub async fn emit(&self, event: AgentEvent) -> Result<(), SessionError> {
        if self.closed_rx.borrow().is_some() {
            return Err(SessionError::ChannelClosed);
        }
        self.events
            .send(event)
            .await
            .map_err(|e| SessionError::SendFailed(e.to_string()))
    }

    /// Close the channel, recording why. The first recorded reason wins.
    pub fn close(&self, reason: DisconnectReason) {
        record_close(&self.closed_tx, reason);
    }
}

fn record_close(tx: &watch::Sender<Option<DisconnectReason>>, reason: DisconnectReason) {
    tx.send_if_modified(|slot| {
        if slot.is_none() {
            *slot = Some(reason);
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
