//! Selection session and channel errors.

use thiserror::Error;

use crate::types::PageId;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The agent could not be placed in the target page. Fatal to the
    /// session, surfaced to the user, never retried.
    #[error("agent installation failed: {0}")]
    Installation(String),

    /// The channel died underneath an endpoint. Transient losses drive the
    /// bounded reconnection policy; permanent ones surface immediately.
    #[error("channel lost: {reason}")]
    ChannelLost { reason: String, transient: bool },

    /// The channel was closed deliberately by one side.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation requires an open channel and there is none.
    #[error("not connected")]
    NotConnected,

    /// No agent is installed for the page.
    #[error("no agent installed for {0}")]
    AgentGone(PageId),

    /// A message could not be delivered on an open channel.
    #[error("send failed: {0}")]
    SendFailed(String),
}
