//! Vote and reaction tallies.

use std::collections::BTreeMap;

use crate::types::{CommentVote, Vote};

/// Up/down totals for a poll. `percent` is the rounded share of up votes,
/// 0 when nobody has voted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub up: u64,
    pub down: u64,
    pub total: u64,
    pub percent: u8,
}

impl VoteTally {
    #[must_use]
    pub fn from_votes(votes: &[Vote]) -> Self {
        let up = votes.iter().filter(|v| v.choice).count() as u64;
        let total = votes.len() as u64;
        Self { up, down: total - up, total, percent: percent(up, total) }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u8
}

/// The viewer's own vote, if any.
#[must_use]
pub fn user_choice(votes: &[Vote], uid: &str) -> Option<bool> {
    votes.iter().find(|v| v.uid == uid).map(|v| v.choice)
}

/// Likes and dislikes on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionTally {
    pub likes: u64,
    pub dislikes: u64,
}

impl ReactionTally {
    #[must_use]
    pub fn from_votes(votes: &BTreeMap<String, CommentVote>) -> Self {
        let likes = votes.values().filter(|v| v.like).count() as u64;
        Self { likes, dislikes: votes.len() as u64 - likes }
    }

    /// Collapsed once dislikes strictly exceed `threshold`.
    #[must_use]
    pub fn is_collapsed(&self, threshold: u64) -> bool {
        self.dislikes > threshold
    }
}

/// Value stored in `upvotesCount`: the number of likes.
#[must_use]
pub fn upvotes_count(votes: &BTreeMap<String, CommentVote>) -> u64 {
    ReactionTally::from_votes(votes).likes
}

/// The viewer's own reaction to a comment, if any.
#[must_use]
pub fn user_reaction(votes: &BTreeMap<String, CommentVote>, uid: &str) -> Option<bool> {
    votes.get(uid).map(|v| v.like)
}
