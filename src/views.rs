//! Read models derived from `AppState` for rendering a poll.

use crate::state::AppState;
use crate::tally::{ReactionTally, VoteTally, user_choice, user_reaction};
use crate::types::{Comment, CommentOrder};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteSummary {
    pub tally: VoteTally,
    /// The viewer's earlier choice, if any.
    pub my_choice: Option<bool>,
    /// False until the votes subscription has delivered.
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub reactions: ReactionTally,
    pub my_reaction: Option<bool>,
    /// Hidden behind a "show" toggle until the viewer expands it.
    pub collapsed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentsView {
    pub comments: Vec<CommentView>,
    pub visible: usize,
    pub total: u64,
    pub loaded: bool,
    pub can_load_more: bool,
    pub order: CommentOrder,
}

#[must_use]
pub fn vote_summary(state: &AppState, poll_id: &str, uid: Option<&str>) -> VoteSummary {
    let Some(votes) = state.polls.get(poll_id).and_then(|p| p.votes.as_deref()) else {
        return VoteSummary::default();
    };
    VoteSummary {
        tally: VoteTally::from_votes(votes),
        my_choice: uid.and_then(|uid| user_choice(votes, uid)),
        loaded: true,
    }
}

#[must_use]
pub fn comments_view(
    state: &AppState,
    poll_id: &str,
    uid: Option<&str>,
    hide_after_dislikes: u64,
) -> CommentsView {
    let order = state.comments_order;
    let Some(poll) = state.polls.get(poll_id) else {
        return CommentsView { order, ..CommentsView::default() };
    };
    let comments: Vec<CommentView> = poll
        .comments
        .iter()
        .flatten()
        .map(|comment| {
            let reactions = ReactionTally::from_votes(&comment.votes);
            CommentView {
                my_reaction: uid.and_then(|uid| user_reaction(&comment.votes, uid)),
                collapsed: reactions.is_collapsed(hide_after_dislikes)
                    && !state.expanded_comments.contains(&comment.id),
                reactions,
                comment: comment.clone(),
            }
        })
        .collect();
    let visible = comments.len();
    let total = poll.comments_count.unwrap_or(0);
    CommentsView {
        comments,
        visible,
        total,
        loaded: poll.comments.is_some(),
        can_load_more: (visible as u64) < total,
        order,
    }
}
