//! Input validation. Runs before any backend call.

use crate::error::ErrorCode;
use crate::types::PollDraft;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("comment is empty")]
    EmptyComment,
    #[error("comment shorter than {min} characters")]
    CommentTooShort { min: usize },
    #[error("comment longer than {max} characters")]
    CommentTooLong { max: usize },
    #[error("poll id is empty")]
    MissingPollId,
    #[error("poll image is missing")]
    MissingImage,
    #[error("poll name is missing")]
    MissingName,
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyComment => "E_COMMENT_EMPTY",
            Self::CommentTooShort { .. } => "E_COMMENT_TOO_SHORT",
            Self::CommentTooLong { .. } => "E_COMMENT_TOO_LONG",
            Self::MissingPollId => "E_MISSING_POLL_ID",
            Self::MissingImage => "E_MISSING_IMAGE",
            Self::MissingName => "E_MISSING_NAME",
        }
    }
}

impl ValidationError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyComment => "Comentariul nu poate fi gol.".into(),
            Self::CommentTooShort { min } => {
                format!("Comentariul trebuie sa contina minim {min} caractere.")
            }
            Self::CommentTooLong { max } => {
                format!("Comentariul poate contine maxim {max} caractere.")
            }
            Self::MissingPollId => "Sondajul nu a fost selectat.".into(),
            Self::MissingImage => "Adauga o poza".into(),
            Self::MissingName => "Adauga un nume".into(),
        }
    }
}

/// Length bounds for comment text, in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRules {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for CommentRules {
    fn default() -> Self {
        Self { min_chars: 3, max_chars: 5000 }
    }
}

/// Validate comment text and return it trimmed.
///
/// # Errors
///
/// `EmptyComment` for blank text, `CommentTooShort` / `CommentTooLong` when
/// the trimmed character count is outside `rules`.
pub fn validate_comment<'a>(text: &'a str, rules: &CommentRules) -> Result<&'a str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    let chars = trimmed.chars().count();
    if chars < rules.min_chars {
        return Err(ValidationError::CommentTooShort { min: rules.min_chars });
    }
    if chars > rules.max_chars {
        return Err(ValidationError::CommentTooLong { max: rules.max_chars });
    }
    Ok(trimmed)
}

/// # Errors
///
/// `MissingPollId` when the id is blank.
pub fn validate_poll_id(poll_id: &str) -> Result<(), ValidationError> {
    if poll_id.trim().is_empty() {
        return Err(ValidationError::MissingPollId);
    }
    Ok(())
}

/// Image is checked first, then the name.
///
/// # Errors
///
/// `MissingImage` when there is no image, `MissingName` for a blank name.
pub fn validate_poll_draft(draft: &PollDraft, has_image: bool) -> Result<(), ValidationError> {
    if !has_image {
        return Err(ValidationError::MissingImage);
    }
    if draft.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    Ok(())
}
