//! # testloom Protocols
//!
//! Shared type and trait definitions for the testloom toolkit. Contains the
//! cross-context message set, the error taxonomy, and the traits at the seams
//! between components - no implementations.
//!
//! ## Core Traits
//!
//! - [`TextGenerator`] - the abstract text-generation capability
//! - [`PageNode`] - handle to one node of a live page's visual tree
//! - [`SelectionSink`] - fire-and-forget selection broadcast target
//! - [`PageDirectory`] - enumeration of live pages for cleanup fan-out
//!
//! The one concrete piece here is [`channel`]: the ordered, lifetime-volatile
//! message path both the inspector and the panel side plug into.

pub mod channel;
pub mod error;
pub mod generator;
pub mod message;
pub mod page;
pub mod types;

pub use channel::{AgentPort, DisconnectReason, Envelope, PanelPort};
pub use error::{GenerateError, SessionError};
pub use generator::TextGenerator;
pub use message::{AgentEvent, AgentRequest, AgentResponse};
pub use page::{NodeHandle, PageDirectory, PageNode, SelectionSink};
pub use types::{
    ElementSnapshot, Generation, PageId, SelectionSnapshot, SessionState, TokenUsage,
};
