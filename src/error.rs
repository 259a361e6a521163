use thiserror::Error;

/// Failure of a pipeline call. Callers only distinguish success from failure;
/// the message is kept for the operational log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("internal conversion fault: {0}")]
    Internal(String),
}
