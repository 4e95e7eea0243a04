use thiserror::Error;

/// Which of the two compared sequences an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceRole {
    Detected,
    Annotated,
}

impl std::fmt::Display for SequenceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceRole::Detected => f.write_str("detected"),
            SequenceRole::Annotated => f.write_str("annotated"),
        }
    }
}

/// Failures of a single detector evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JmxError {
    #[error("{which} event sequence is empty")]
    EmptySequence { which: SequenceRole },
    #[error("trim bounds start={start} end={end} leave no margin for {len} annotations")]
    InvalidTrimBounds { start: usize, end: isize, len: usize },
    #[error("parameter {name} must be positive, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type JmxResult<T> = std::result::Result<T, JmxError>;
