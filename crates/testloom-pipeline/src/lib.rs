//! # testloom Pipeline
//!
//! Turns one finalized selection plus user intent into ordered calls to the
//! abstract generation capability: prompt planning over the requested output
//! modes, sequential execution with token accounting and all-or-nothing
//! output, and the tabular exact-count corrective retry loop for test data.

pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod table;
pub mod testdata;

pub use error::PipelineError;
pub use pipeline::{CodeGenJob, GenerationPipeline, PipelineOutput};
pub use prompts::{OutputModes, PromptKey, PromptPlan, PromptVars, plan_prompt_keys, render};
pub use table::{DataTable, DuplicatePolicy, TypeTally};
pub use testdata::{TestDataJob, TestDataOutput};
