//! Settings schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub limits: LimitSettings,
}

/// Selected provider, model, and per-provider API keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Selected provider id (e.g., "openai", "groq").
    #[serde(default)]
    pub selected: String,

    /// Selected model identifier.
    #[serde(default)]
    pub model: String,

    /// API key per provider id.
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

impl ProviderSettings {
    /// API key for the currently selected provider, if configured.
    pub fn selected_key(&self) -> Option<&str> {
        self.keys.get(&self.selected).map(String::as_str)
    }
}

/// Output-mode flags and target language/engine pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Generate a feature file.
    #[serde(default)]
    pub feature: bool,

    /// Generate a page object.
    #[serde(default = "default_true")]
    pub page: bool,

    /// Target language binding (e.g., "java", "ts").
    #[serde(default = "default_language")]
    pub language: String,

    /// Target browser engine (e.g., "selenium", "playwright").
    #[serde(default = "default_engine")]
    pub engine: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            feature: false,
            page: true,
            language: default_language(),
            engine: default_engine(),
        }
    }
}

/// Numeric limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Warn when one request's combined usage crosses this threshold.
    #[serde(default = "default_token_warning_threshold")]
    pub token_warning_threshold: u64,

    /// Hard cap on requested test-data rows.
    #[serde(default = "default_test_data_max_rows")]
    pub test_data_max_rows: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            token_warning_threshold: default_token_warning_threshold(),
            test_data_max_rows: default_test_data_max_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "java".to_string()
}

fn default_engine() -> String {
    "selenium".to_string()
}

fn default_token_warning_threshold() -> u64 {
    10_000
}

fn default_test_data_max_rows() -> u32 {
    200
}
