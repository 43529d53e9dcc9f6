//! Shared data types.

mod generation;
mod selection;

pub use generation::{Generation, TokenUsage, extract_fenced_blocks};
pub use selection::{ElementSnapshot, PageId, SelectionSnapshot, SessionState};
