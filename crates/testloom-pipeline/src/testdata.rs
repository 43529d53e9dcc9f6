//! Tabular exact-count generation.
//!
//! When neither category flag is chosen the request is constrained to an
//! exact split: floor(count/2) positive, the rest negative. The loop runs at
//! most one corrective round for the shortfall and accepts what it gets
//! after that - bounded retry, not best-effort-forever.

use tracing::{info, warn};

use testloom_protocols::types::{SelectionSnapshot, TokenUsage};

use crate::error::PipelineError;
use crate::pipeline::GenerationPipeline;
use crate::prompts::{PromptKey, PromptVars, render};
use crate::table::DataTable;

/// One test-data request.
#[derive(Debug, Clone)]
pub struct TestDataJob {
    pub selection: SelectionSnapshot,
    pub instruction: String,
    pub count: u32,
    pub positive: bool,
    pub negative: bool,
    pub model: String,
}

/// Result of a tabular job.
#[derive(Debug, Clone)]
pub struct TestDataOutput {
    /// Merged rows re-serialized under the first response's header order.
    pub csv: String,
    pub table: DataTable,
    pub usage: TokenUsage,
    pub corrective_calls: u32,
}

const EXAMPLE_CSV: &str = "\nExample CSV:\n```csv\nname,email,age,type\nJohn Doe,john@example.com,30,positive\nJane Doe,jane@example.com,25,negative\n```\n";

impl GenerationPipeline {
    /// Generate tabular test data, topping up exact category counts with at
    /// most one corrective call.
    pub async fn generate_test_data(
        &self,
        job: &TestDataJob,
    ) -> Result<TestDataOutput, PipelineError> {
        let _guard = self.begin()?;

        let count = job.count.clamp(1, self.max_rows);
        let split = if !job.positive && !job.negative {
            let desired_positive = count / 2;
            Some((desired_positive, count - desired_positive))
        } else {
            None
        };

        let built = render(
            PromptKey::TestDataRandom,
            &PromptVars {
                dom_content: job.selection.combined(),
                ..Default::default()
            },
        );

        let mut prompt = format!("{built} Additional Instructions: {}", job.instruction);
        prompt.push_str(&format!(
            "\ncount:{count}\npositive:{}\nnegative:{}",
            job.positive, job.negative
        ));
        match split {
            Some((desired_positive, desired_negative)) => prompt.push_str(&format!(
                "\nNote: Neither positive nor negative was selected. Generate exactly \
                 {desired_positive} positive and {desired_negative} negative records and \
                 include a column named \"type\" with values \"positive\" or \"negative\". \
                 Return CSV only with a header row."
            )),
            None => prompt.push_str(
                "\nNote: Include a column named \"type\" with values \"positive\" or \
                 \"negative\" matching each record.",
            ),
        }
        prompt.push_str(EXAMPLE_CSV);

        let mut usage = TokenUsage::default();
        info!(count, model = %job.model, "test data generation call");
        let first = self.generator().generate(&prompt, &job.model).await?;
        usage.add(first.usage);

        let mut table = DataTable::parse(strip_fences(first.text.trim()))?;
        let mut corrective_calls = 0;

        if let Some((desired_positive, desired_negative)) = split {
            let tally = table.tally_types();
            let need_positive = desired_positive.saturating_sub(tally.positive);
            let need_negative = desired_negative.saturating_sub(tally.negative);

            if need_positive > 0 || need_negative > 0 {
                info!(
                    need_positive,
                    need_negative, "category shortfall, issuing corrective call"
                );
                let mut missing = format!(
                    "Provide only the missing {} rows as CSV with the same header: {}. ",
                    need_positive + need_negative,
                    table.headers.join(",")
                );
                missing.push_str(&format!(
                    "Return {need_positive} positive and {need_negative} negative rows \
                     (type column should be \"positive\"/\"negative\"). Do not include \
                     any explanation or markdown."
                ));

                let corrective = self
                    .generator()
                    .generate(
                        &format!("{built} Additional Instructions: {missing}"),
                        &job.model,
                    )
                    .await?;
                usage.add(corrective.usage);
                corrective_calls = 1;

                match DataTable::parse(strip_fences(corrective.text.trim())) {
                    Ok(extra) => {
                        let dropped = table.absorb(extra, self.duplicate_policy);
                        if dropped > 0 {
                            warn!(dropped, "duplicate corrective rows dropped");
                        }
                    }
                    // One corrective round only; a bad top-up is accepted
                    // as a shortfall rather than retried.
                    Err(err) => warn!(%err, "corrective response unparseable"),
                }
            }
        }

        Ok(TestDataOutput {
            csv: table.serialize(),
            table,
            usage,
            corrective_calls,
        })
    }
}

/// Strip a surrounding markdown fence (```csv ... ```), if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(rest) => match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => "",
        },
        None => trimmed,
    };
    let body = body.trim_end();
    body.strip_suffix("```").map(str::trim_end).unwrap_or(body)
}

#[cfg(test)]
#[path = "testdata_tests.rs"]
mod tests;
