use thiserror::Error;
use whisker_types::MemoryRange;

/// Ways an evaluation request can be malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluatorError {
    #[error("RTT range must be a single value, got [{min}, {max}]")]
    RttNotFixed { min: f64, max: f64 },

    #[error("link speed range [{min}, {max}] must be positive, finite and ordered")]
    InvalidLinkRange { min: f64, max: f64 },

    #[error("link speed sweep needs at least one step")]
    ZeroSteps,

    #[error("no whisker in the tree has domain {domain}")]
    NoMatchingWhisker { domain: MemoryRange },
}
