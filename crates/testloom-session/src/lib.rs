//! # testloom Session
//!
//! The panel-facing side of an inspection session: [`ChannelManager`]
//! presents a stable logical connection to one page's selection agent over
//! channels whose underlying lifetimes are volatile, and owns the bounded
//! reconnection policy.

pub mod manager;

pub use manager::{
    ChannelManager, ConnectionState, InspectorStatus, ManagerEvent, RetryPolicy,
};
