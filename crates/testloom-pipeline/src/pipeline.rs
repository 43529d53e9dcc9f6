//! Sequential generation pipeline.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use testloom_protocols::generator::TextGenerator;
use testloom_protocols::types::{SelectionSnapshot, TokenUsage};

use crate::error::PipelineError;
use crate::prompts::{OutputModes, PromptVars, plan_prompt_keys, render};
use crate::table::DuplicatePolicy;

const DEFAULT_MAX_ROWS: u32 = 200;

/// One code-generation request: a finalized selection plus user intent.
#[derive(Debug, Clone)]
pub struct CodeGenJob {
    pub selection: SelectionSnapshot,
    pub page_url: String,
    pub instruction: String,
    pub modes: OutputModes,
    pub language: String,
    pub engine: String,
    pub model: String,
}

/// Combined result of one request's ordered generation calls.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub text: String,
    pub usage: TokenUsage,
    pub warnings: Vec<String>,
}

/// Executes generation jobs against the abstract capability.
///
/// At most one job runs per pipeline instance; a second request while one is
/// outstanding is rejected with [`PipelineError::Busy`].
pub struct GenerationPipeline {
    generator: Arc<dyn TextGenerator>,
    in_flight: Mutex<()>,
    pub(crate) duplicate_policy: DuplicatePolicy,
    pub(crate) max_rows: u32,
}

impl GenerationPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            in_flight: Mutex::new(()),
            duplicate_policy: DuplicatePolicy::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Build a pipeline configured from the persisted settings.
    pub fn from_settings(
        generator: Arc<dyn TextGenerator>,
        settings: &testloom_config::Settings,
    ) -> Self {
        Self::new(generator).with_max_rows(settings.limits.test_data_max_rows)
    }

    /// Configure how duplicate rows from a corrective round are handled.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Configure the hard cap on requested test-data rows.
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub(crate) fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    /// Claim the single in-flight slot or reject.
    pub(crate) fn begin(&self) -> Result<MutexGuard<'_, ()>, PipelineError> {
        self.in_flight.try_lock().map_err(|_| PipelineError::Busy)
    }

    /// Run the ordered generation calls for one request.
    ///
    /// Outputs are trimmed, joined by a blank line, and usage accumulates
    /// across calls. Any failure aborts the remaining calls and discards
    /// output already produced - the operation is all-or-nothing.
    pub async fn generate_code(&self, job: &CodeGenJob) -> Result<PipelineOutput, PipelineError> {
        let _guard = self.begin()?;

        let plan = plan_prompt_keys(job.modes, &job.language, &job.engine);
        for warning in &plan.warnings {
            warn!(%warning, "unsupported output combination");
        }

        let vars = PromptVars {
            dom_content: job.selection.combined(),
            page_url: job.page_url.clone(),
            user_action: String::new(),
        };

        let mut combined = String::new();
        let mut usage = TokenUsage::default();
        for key in &plan.keys {
            let prompt = format!(
                "{} Additional Instructions: {}",
                render(*key, &vars),
                job.instruction
            );
            info!(key = key.name(), model = %job.model, "generation call");
            let generation = self.generator.generate(&prompt, &job.model).await?;
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            combined.push_str(generation.text.trim());
            usage.add(generation.usage);
        }

        Ok(PipelineOutput {
            text: combined,
            usage,
            warnings: plan.warnings,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
