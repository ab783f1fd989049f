/// Reasons a prompt is rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a prompt")]
    Empty,

    #[error("Prompt should be below {max} characters (got {length})")]
    TooLong { length: usize, max: usize },
}
