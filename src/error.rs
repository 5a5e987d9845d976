//! Error types for the analysis core

use thiserror::Error;

/// Errors raised by the cluster index, admixture calculator and
/// significance tester. Validation errors are raised before any
/// aggregation starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A caller-supplied argument cannot be analysed (empty subset,
    /// zero replicates, sample larger than its universe)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A form points at a language that is not in the language set
    #[error("Form '{form_id}' references unknown language '{language_id}'")]
    DataIntegrity {
        form_id: String,
        language_id: String,
    },

    /// The replicate thread pool could not be started
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// The permutation loop was stopped through its cancel token
    #[error("Permutation test cancelled after {completed} replicates")]
    Cancelled { completed: usize },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
