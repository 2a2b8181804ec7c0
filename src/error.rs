//! Error types.

/// Fatal setup errors.
///
/// These are raised once, when patterns or a [`JudgeConfig`](crate::JudgeConfig)
/// are validated. A machine that was built successfully has no runtime error
/// path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("pattern set is empty")]
    EmptyPatternSet,

    #[error("bpm must be greater than 0, got {0}")]
    NonPositiveBpm(f64),

    #[error("pattern '{name}' has {len} steps, expected 16")]
    MalformedPattern { name: String, len: usize },

    #[error("pattern '{name}' has value {value} at step {step}, expected 0 or 1")]
    InvalidStepValue { name: String, step: usize, value: u8 },

    #[error("tolerances must satisfy 0 <= perfect < good, got perfect={perfect} good={good}")]
    InvalidTolerance { perfect: f64, good: f64 },

    #[error("user input phase must last at least one measure")]
    ZeroUserInputMeasures,

    #[error("extra shake penalty must be a finite number >= 0, got {0}")]
    NegativePenalty(f64),

    #[error("pass threshold must be within [0, 1], got {0}")]
    InvalidPassThreshold(f64),

    #[error("start delay must be a finite number >= 0, got {0}")]
    NegativeStartDelay(f64),

    #[error("shake queue capacity must be greater than 0")]
    ZeroShakeCapacity,
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
