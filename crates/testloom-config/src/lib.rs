//! # testloom Config
//!
//! Persisted settings consumed - never written - by the core: selected
//! provider and model, per-provider API keys, output-mode flags, and limits.
//! Components read the current value at session start and observe a change
//! notification through [`SettingsWatch`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod watch;

pub use error::ConfigError;
pub use loader::SettingsLoader;
pub use schema::{LimitSettings, OutputSettings, ProviderSettings, Settings};
pub use watch::{SettingsStore, SettingsWatch};
