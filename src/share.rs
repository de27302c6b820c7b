//! Share links for polls.

use url::Url;

use crate::error::ErrorCode;
use crate::rich_text::summary;
use crate::types::Poll;
use crate::view_state::{PARAM_CATEGORY, PARAM_POLL, poll_slug, set_param};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    #[error("sharing is not supported on this device")]
    Unsupported,
    #[error("share failed: {0}")]
    Failed(String),
}

impl ErrorCode for ShareError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported => "E_SHARE_UNSUPPORTED",
            Self::Failed(_) => "E_SHARE_FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub title: String,
    pub text: String,
    pub url: Url,
}

/// Link that opens `poll` in its category tab.
#[must_use]
pub fn share_link(poll: &Poll, page: &Url) -> ShareLink {
    let mut url = page.clone();
    set_param(&mut url, PARAM_POLL, &poll_slug(&poll.name));
    set_param(&mut url, PARAM_CATEGORY, poll.category.as_str());
    ShareLink { title: poll.title(), text: summary(&poll.details), url }
}

/// Platform share sheet.
pub trait ShareTarget: Send + Sync {
    /// # Errors
    ///
    /// `Unsupported` when the platform has no share sheet.
    fn share(&self, link: &ShareLink) -> Result<(), ShareError>;
}

/// Platform without a share sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShareSheet;

impl ShareTarget for NoShareSheet {
    fn share(&self, _link: &ShareLink) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }
}

/// Writes the link to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintShareSheet;

impl ShareTarget for PrintShareSheet {
    fn share(&self, link: &ShareLink) -> Result<(), ShareError> {
        println!("{}\n{}\n{}", link.title, link.text, link.url);
        Ok(())
    }
}
