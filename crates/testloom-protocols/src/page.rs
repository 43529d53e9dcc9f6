//! Page-facing trait seams.
//!
//! The selection agent's only access to the live page goes through
//! [`PageNode`]: serialization for structural identity, and class toggles for
//! the visual-only side effects. Broadcast and cleanup fan-out cross context
//! boundaries through [`SelectionSink`] and [`PageDirectory`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::types::{PageId, SelectionSnapshot};

/// Handle to one node of a page's visual tree.
pub trait PageNode: Send + Sync {
    /// Serialized markup of the node. Structural identity is derived from
    /// this value.
    fn outer_html(&self) -> String;

    /// Add a styling class to the node.
    fn add_class(&self, class: &str);

    /// Remove a styling class from the node.
    fn remove_class(&self, class: &str);

    /// Whether the node is still attached to a live page.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Shared node handle; cheap to clone across the agent's bookkeeping.
pub type NodeHandle = Arc<dyn PageNode>;

/// Fire-and-forget target for selection broadcasts.
///
/// `publish` must never block the caller. Delivery is best-effort with no
/// acknowledgment and no retry; the stored copy is a crash-recovery
/// convenience only.
pub trait SelectionSink: Send + Sync {
    fn publish(&self, page: PageId, selection: SelectionSnapshot);
}

/// Enumeration of live pages, used for host-suspend cleanup fan-out.
#[async_trait]
pub trait PageDirectory: Send + Sync {
    /// Ids of every page with an installed agent.
    async fn page_ids(&self) -> Vec<PageId>;

    /// Deliver a cleanup signal to one page.
    async fn send_cleanup(&self, page: PageId) -> Result<(), SessionError>;
}
