//! Prompt validation, run before anything touches the network.

use crate::error::ValidationError;

/// Maximum prompt length in characters, measured after trimming.
pub const MAX_PROMPT_LENGTH: usize = 200;

/// Validate a raw prompt and return its trimmed form.
///
/// Rejects prompts that are empty after trimming and prompts longer than
/// [`MAX_PROMPT_LENGTH`] characters.
pub fn validate_prompt(raw: &str) -> Result<String, ValidationError> {
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(ValidationError::Empty);
    }
    let length = prompt.chars().count();
    if length > MAX_PROMPT_LENGTH {
        return Err(ValidationError::TooLong {
            length,
            max: MAX_PROMPT_LENGTH,
        });
    }
    Ok(prompt.to_string())
}
