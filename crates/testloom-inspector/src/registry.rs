//! Page registry: one agent event loop per page.
//!
//! Installation is an explicit idempotent operation that reports whether it
//! was newly performed; the registry write lock is the re-entrancy guard
//! that keeps two concurrent installs from double-instrumenting a page.
//!
//! Each installed page runs a single-threaded event loop that owns its
//! [`SelectionAgent`] and serves both the one-off request path and whatever
//! channel is currently attached.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info};

use testloom_protocols::channel::{AgentPort, DisconnectReason, Envelope};
use testloom_protocols::error::SessionError;
use testloom_protocols::message::{AgentEvent, AgentRequest, AgentResponse};
use testloom_protocols::page::{PageDirectory, SelectionSink};
use testloom_protocols::types::PageId;

use crate::agent::{PointerEvent, SelectionAgent};

/// Whether `ensure_installed` actually placed a new agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    New,
    Existing,
}

enum PageCommand {
    Pointer(PointerEvent),
    Request {
        request: AgentRequest,
        reply: oneshot::Sender<AgentResponse>,
    },
    Attach(AgentPort),
    Navigated,
    Frozen,
    Shutdown,
}

struct PageEntry {
    cmd: mpsc::Sender<PageCommand>,
    frozen: bool,
}

/// Process-wide registry of per-page selection agents.
pub struct PageRegistry {
    sink: Arc<dyn SelectionSink>,
    pages: RwLock<HashMap<PageId, PageEntry>>,
}

impl PageRegistry {
    pub fn new(sink: Arc<dyn SelectionSink>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            pages: RwLock::new(HashMap::new()),
        })
    }

    /// Install an agent into `page` if none is present yet.
    pub async fn ensure_installed(&self, page: PageId) -> Result<Installed, SessionError> {
        let mut pages = self.pages.write().await;
        if pages.contains_key(&page) {
            debug!(%page, "agent already installed");
            return Ok(Installed::Existing);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        tokio::spawn(agent_loop(page, self.sink.clone(), cmd_rx));
        pages.insert(
            page,
            PageEntry {
                cmd: cmd_tx,
                frozen: false,
            },
        );
        info!(%page, "selection agent installed");
        Ok(Installed::New)
    }

    /// Feed one pointer signal from the page's visual tree.
    pub async fn pointer(&self, page: PageId, event: PointerEvent) -> Result<(), SessionError> {
        self.command(page, PageCommand::Pointer(event)).await
    }

    /// Attach a fresh channel endpoint to the page's agent. Any previously
    /// attached channel is closed.
    pub async fn attach_channel(&self, page: PageId, port: AgentPort) -> Result<(), SessionError> {
        let pages = self.pages.read().await;
        let entry = pages.get(&page).ok_or(SessionError::AgentGone(page))?;
        if entry.frozen {
            return Err(SessionError::ChannelLost {
                reason: "page frozen".to_string(),
                transient: true,
            });
        }
        entry
            .cmd
            .send(PageCommand::Attach(port))
            .await
            .map_err(|_| SessionError::AgentGone(page))
    }

    /// One-off request path; works without an open channel.
    pub async fn request(
        &self,
        page: PageId,
        request: AgentRequest,
    ) -> Result<AgentResponse, SessionError> {
        let (tx, rx) = oneshot::channel();
        {
            let pages = self.pages.read().await;
            let entry = pages.get(&page).ok_or(SessionError::AgentGone(page))?;
            if entry.frozen {
                return Err(SessionError::ChannelLost {
                    reason: "page frozen".to_string(),
                    transient: true,
                });
            }
            entry
                .cmd
                .send(PageCommand::Request { request, reply: tx })
                .await
                .map_err(|_| SessionError::AgentGone(page))?;
        }
        rx.await.map_err(|_| SessionError::AgentGone(page))
    }

    /// The page loaded a new document: the session resets and the channel
    /// dies transiently.
    pub async fn navigated(&self, page: PageId) -> Result<(), SessionError> {
        {
            let mut pages = self.pages.write().await;
            if let Some(entry) = pages.get_mut(&page) {
                entry.frozen = false;
            }
        }
        self.command(page, PageCommand::Navigated).await
    }

    /// The page was frozen or moved into a history cache.
    pub async fn frozen(&self, page: PageId) -> Result<(), SessionError> {
        {
            let mut pages = self.pages.write().await;
            let entry = pages.get_mut(&page).ok_or(SessionError::AgentGone(page))?;
            entry.frozen = true;
        }
        self.command(page, PageCommand::Frozen).await
    }

    /// The page came back from the cache.
    pub async fn resumed(&self, page: PageId) -> Result<(), SessionError> {
        let mut pages = self.pages.write().await;
        let entry = pages.get_mut(&page).ok_or(SessionError::AgentGone(page))?;
        entry.frozen = false;
        Ok(())
    }

    /// The page was destroyed; the agent tears down with it.
    pub async fn page_closed(&self, page: PageId) {
        let entry = self.pages.write().await.remove(&page);
        if let Some(entry) = entry {
            let _ = entry.cmd.send(PageCommand::Shutdown).await;
            info!(%page, "selection agent torn down");
        }
    }

    async fn command(&self, page: PageId, cmd: PageCommand) -> Result<(), SessionError> {
        let pages = self.pages.read().await;
        let entry = pages.get(&page).ok_or(SessionError::AgentGone(page))?;
        entry
            .cmd
            .send(cmd)
            .await
            .map_err(|_| SessionError::AgentGone(page))
    }
}

#[async_trait]
impl PageDirectory for PageRegistry {
    async fn page_ids(&self) -> Vec<PageId> {
        let mut ids: Vec<PageId> = self.pages.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    async fn send_cleanup(&self, page: PageId) -> Result<(), SessionError> {
        self.request(page, AgentRequest::Cleanup).await.map(|_| ())
    }
}

enum Input {
    Cmd(Option<PageCommand>),
    Channel(Option<Envelope>),
}

/// Per-page event loop. Single-threaded and cooperative; concurrency with
/// other contexts comes only from their independent lifetimes.
async fn agent_loop(
    page: PageId,
    sink: Arc<dyn SelectionSink>,
    mut cmd_rx: mpsc::Receiver<PageCommand>,
) {
    let mut agent = SelectionAgent::new(page, sink);
    let mut port: Option<AgentPort> = None;

    loop {
        let input = match port.as_mut() {
            Some(p) => tokio::select! {
                cmd = cmd_rx.recv() => Input::Cmd(cmd),
                env = p.next_request() => Input::Channel(env),
            },
            None => Input::Cmd(cmd_rx.recv().await),
        };

        match input {
            Input::Cmd(None) => {
                if let Some(p) = port.take() {
                    p.close(DisconnectReason::PageClosed);
                }
                break;
            }
            Input::Cmd(Some(PageCommand::Pointer(event))) => {
                if let Some(snapshot) = agent.handle_pointer(event) {
                    if let Some(p) = &port {
                        let changed = AgentEvent::SelectionChanged {
                            selection: snapshot,
                        };
                        if p.emit(changed).await.is_err() {
                            debug!(%page, "selection event not delivered");
                        }
                    }
                }
            }
            Input::Cmd(Some(PageCommand::Request { request, reply })) => {
                let _ = reply.send(agent.dispatch(request));
            }
            Input::Cmd(Some(PageCommand::Attach(new_port))) => {
                if let Some(old) = port.take() {
                    old.close(DisconnectReason::Explicit);
                }
                debug!(%page, "channel attached");
                port = Some(new_port);
            }
            Input::Cmd(Some(PageCommand::Navigated)) => {
                agent.reset();
                if let Some(p) = port.take() {
                    p.close(DisconnectReason::Navigated);
                }
            }
            Input::Cmd(Some(PageCommand::Frozen)) => {
                if let Some(p) = port.take() {
                    p.close(DisconnectReason::Frozen);
                }
            }
            Input::Cmd(Some(PageCommand::Shutdown)) => {
                if let Some(p) = port.take() {
                    p.close(DisconnectReason::PageClosed);
                }
                agent.cleanup();
                break;
            }
            Input::Channel(Some(envelope)) => {
                let _ = envelope.reply.send(agent.dispatch(envelope.request));
            }
            Input::Channel(None) => {
                // Panel side went away; the channel is done.
                port = None;
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
