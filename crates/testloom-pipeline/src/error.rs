//! Pipeline errors.

use thiserror::Error;

use testloom_protocols::error::GenerateError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Any failure from the generation capability, surfaced verbatim.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// A second job was requested while one is outstanding.
    #[error("a generation job is already in flight")]
    Busy,

    /// Generated text could not be parsed into the expected structured form.
    #[error("generated output could not be parsed: {0}")]
    MalformedOutput(String),
}
