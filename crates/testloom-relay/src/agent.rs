//! Relay agent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use testloom_protocols::page::{PageDirectory, SelectionSink};
use testloom_protocols::types::{PageId, SelectionSnapshot};

use crate::fetch::{FetchOptions, FetchOutcome, run_fetch};

/// The durable last-known selection, stamped at arrival.
#[derive(Debug, Clone)]
pub struct StoredSelection {
    pub page: PageId,
    pub selection: SelectionSnapshot,
    pub received_at: DateTime<Utc>,
}

/// Process-wide relay agent.
///
/// The selection register is a single-slot last-writer-wins mailbox: writes
/// are whole-value replacements resolved by arrival order, publishers are
/// never blocked and never retried.
pub struct RelayAgent {
    slot: watch::Sender<Option<StoredSelection>>,
    client: reqwest::Client,
}

impl RelayAgent {
    pub fn new() -> Arc<Self> {
        let (slot, _) = watch::channel(None);
        Arc::new(Self {
            slot,
            client: reqwest::Client::new(),
        })
    }

    /// The last selection any page broadcast, if one arrived.
    pub fn last_selection(&self) -> Option<StoredSelection> {
        self.slot.borrow().clone()
    }

    /// Observe register overwrites.
    pub fn subscribe(&self) -> watch::Receiver<Option<StoredSelection>> {
        self.slot.subscribe()
    }

    /// Perform a network call on behalf of a caller whose own attempt
    /// failed. Always returns a normalized outcome, never an error.
    pub async fn forward(&self, url: &str, options: FetchOptions) -> FetchOutcome {
        debug!(%url, "forwarding external request");
        run_fetch(&self.client, url, options).await
    }

    /// The host process is shutting down: broadcast a cleanup signal to
    /// every known page. No acknowledgment is awaited and nothing retries.
    pub async fn host_suspend(&self, directory: &dyn PageDirectory) {
        let pages = directory.page_ids().await;
        info!(pages = pages.len(), "host suspending, broadcasting cleanup");
        for page in pages {
            if let Err(err) = directory.send_cleanup(page).await {
                debug!(%page, %err, "cleanup not delivered");
            }
        }
    }
}

impl SelectionSink for RelayAgent {
    fn publish(&self, page: PageId, selection: SelectionSnapshot) {
        self.slot.send_replace(Some(StoredSelection {
            page,
            selection,
            received_at: Utc::now(),
        }));
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
