//! # testloom Relay
//!
//! The only component whose lifetime outlives any single page or panel: a
//! best-effort last-known-selection store, a normalized fetch forwarder used
//! as a fallback network path, and the host-suspend cleanup fan-out.

pub mod agent;
pub mod fetch;

pub use agent::{RelayAgent, StoredSelection};
pub use fetch::{FetchOptions, FetchOutcome};
