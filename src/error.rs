//! Application error: the union every `AppContext` operation returns.
//!
//! Each module owns its own `thiserror` enum; `AppError` wraps them. Every
//! error carries a grepable code via `ErrorCode`, and a user-facing text via
//! `AppError::user_message` (shown as an error notice).

use crate::backend::StoreError;
use crate::backend::identity::AuthError;
use crate::backend::storage::StorageError;
use crate::consent::KeyValueError;
use crate::context::ContextError;
use crate::share::ShareError;
use crate::validate::ValidationError;

/// Grepable error code, stable across message wording changes.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Preferences(#[from] KeyValueError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("sign-in required")]
    SignInRequired,
    #[error("administrator privileges required")]
    NotAdmin,
    #[error("poll not found: {0}")]
    PollNotFound(String),
    #[error("comment not found: {0}")]
    CommentNotFound(String),
}

impl ErrorCode for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Preferences(e) => e.error_code(),
            Self::Share(e) => e.error_code(),
            Self::Context(e) => e.error_code(),
            Self::SignInRequired => "E_SIGN_IN_REQUIRED",
            Self::NotAdmin => "E_NOT_ADMIN",
            Self::PollNotFound(_) => "E_POLL_NOT_FOUND",
            Self::CommentNotFound(_) => "E_COMMENT_NOT_FOUND",
        }
    }
}

impl AppError {
    /// Text for the error notice shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.user_message(),
            Self::SignInRequired => "Trebuie sa fii autentificat.".into(),
            Self::NotAdmin => "Nu ai drepturi de administrator.".into(),
            Self::PollNotFound(_) => "Sondajul nu a fost gasit.".into(),
            Self::CommentNotFound(_) => "Comentariul nu a fost gasit.".into(),
            Self::Share(ShareError::Unsupported) => "Web Share API not supported.".into(),
            other => other.to_string(),
        }
    }
}
