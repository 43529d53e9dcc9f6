//! Generation result types.

use serde::{Deserialize, Serialize};

/// Token accounting for one or more generation calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Accumulate another call's usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Result of one call to the abstract generation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text.
    pub text: String,
    /// Token usage reported by the provider.
    #[serde(default)]
    pub usage: TokenUsage,
}

impl Generation {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Extract all ``` fenced blocks from generated text, joined by a blank line.
///
/// Returns the input unchanged when no complete fenced block is present.
pub fn extract_fenced_blocks(text: &str) -> String {
    let mut blocks: Vec<&str> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        match after.find("```") {
            Some(end) => {
                blocks.push(rest[start..start + 3 + end + 3].trim());
                rest = &after[end + 3..];
            }
            None => break,
        }
    }
    if blocks.is_empty() {
        text.to_string()
    } else {
        blocks.join("\n\n")
    }
}

#[cfg(test)]
#[path = "generation_tests.rs"]
mod tests;
