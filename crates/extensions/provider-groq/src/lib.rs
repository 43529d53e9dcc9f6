//! # testloom Groq provider
//!
//! [`TextGenerator`](testloom_protocols::TextGenerator) implementation over
//! Groq's OpenAI-compatible chat-completions endpoint.

mod provider;

pub use provider::GroqGenerator;
