//! Error types for engine construction

use thiserror::Error;

/// Malformed construction input. Construction never yields a partially
/// initialized engine when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The stage list is empty
    #[error("engine configuration must include at least one stage")]
    EmptyStages,
    /// A stage name is empty or whitespace only
    #[error("stage name at index {index} cannot be empty")]
    BlankStageName {
        /// Position of the offending name in the stage list
        index: usize,
    },
    /// No observer was supplied
    #[error("engine configuration must include an observer")]
    MissingObserver,
    /// A transform is registered for a stage that is not in the cycle
    #[error("invalid stage name '{stage}' in transforms, must be one of: {stages}")]
    UnknownTransformStage {
        /// The unknown stage name
        stage: String,
        /// Comma-separated list of the configured stages
        stages: String,
    },
}
