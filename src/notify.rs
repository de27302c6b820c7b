//! User-facing notices (toasts).
//!
//! Notices are queued in `AppState` by the reducer and mirrored to the log.
//! The queue is bounded; the oldest notice is dropped first.

use std::collections::VecDeque;
use std::fmt;

use tracing::{info, warn};

/// Notices kept before the oldest is dropped.
pub const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    /// Mirror the notice to the log.
    pub fn log(&self) {
        match self.level {
            NoticeLevel::Error => warn!(text = %self.text, "notice"),
            NoticeLevel::Success | NoticeLevel::Info => info!(level = %self.level, text = %self.text, "notice"),
        }
    }
}

/// Append to a bounded queue.
pub fn push_bounded(queue: &mut VecDeque<Notice>, notice: Notice) {
    if queue.len() >= MAX_NOTICES {
        queue.pop_front();
    }
    queue.push_back(notice);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drops_oldest() {
        let mut queue = VecDeque::new();
        for i in 0..=MAX_NOTICES {
            push_bounded(&mut queue, Notice::info(i.to_string()));
        }
        assert_eq!(queue.len(), MAX_NOTICES);
        assert_eq!(queue.front().unwrap().text, "1");
    }

    #[test]
    fn constructors_set_level() {
        assert_eq!(Notice::success("a").level, NoticeLevel::Success);
        assert_eq!(Notice::error("a").level, NoticeLevel::Error);
        assert_eq!(Notice::info("a").level.to_string(), "info");
    }
}
