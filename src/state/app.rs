//! Application state and its reducer.
//!
//! DESIGN
//! ======
//! `reduce` is pure: it takes the previous state by value and returns the
//! next one. `Action` is closed, so every variant is handled and there is no
//! unknown-action fallback to get wrong.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::auth::AuthState;
use super::modal::{ModalDescriptor, ModalRegistry};
use super::polls::PollsData;
use crate::backend::paths::SUGGESTIONS_POLL_ID;
use crate::notify::{Notice, push_bounded};
use crate::types::{Category, Comment, CommentOrder, CommentVote, User, Vote};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub polls: PollsData,
    /// True once the first poll list snapshot has been applied.
    pub polls_loaded: bool,
    pub current_poll_id: Option<String>,
    /// Per-poll comment limit; polls not listed use the page size.
    pub comments_limits: HashMap<String, u32>,
    pub comments_order: CommentOrder,
    pub selected_category: Category,
    /// Collapsed comments the viewer chose to expand.
    pub expanded_comments: BTreeSet<String>,
    pub modals: ModalRegistry,
    pub auth: AuthState,
    pub notices: VecDeque<Notice>,
    pub path: String,
}

impl AppState {
    #[must_use]
    pub fn current_poll(&self) -> Option<&crate::types::Poll> {
        self.current_poll_id.as_deref().and_then(|id| self.polls.get(id))
    }

    #[must_use]
    pub fn comments_limit(&self, poll_id: &str, page_size: u32) -> u32 {
        self.comments_limits.get(poll_id).copied().unwrap_or(page_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the poll list; live votes and comments carry over.
    SetPolls(PollsData),
    SetCurrentPollId(String),
    ChangeCurrentPoll(String),
    SetCommentsLimits(HashMap<String, u32>),
    SetCommentsOrder(CommentOrder),
    SetPath(String),
    SelectCategory(Category),
    /// A saved vote, applied ahead of the votes snapshot. Replaces any
    /// earlier vote by the same user; ignored until votes have loaded.
    CastVote { poll_id: String, vote: Vote },
    UpdateVotes { poll_id: String, votes: Vec<Vote> },
    UpdateCommentsLimit { poll_id: String, limit: u32 },
    UpdateComments { poll_id: String, comments: Vec<Comment>, total: u64 },
    UpdateCommentVotes {
        poll_id: String,
        comment_id: String,
        votes: BTreeMap<String, CommentVote>,
        upvotes_count: u64,
    },
    ExpandComment(String),
    AddModal(ModalDescriptor),
    CloseModal(String),
    SetUser(Option<User>),
    SetAuthLoading(bool),
    Notify(Notice),
    /// Queue an error notice.
    HandleError(String),
    DismissNotice,
}

#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetPolls(mut polls) => {
            polls.carry_live_fields(&state.polls);
            state.polls = polls;
            state.polls_loaded = true;
        }
        Action::SetCurrentPollId(id) | Action::ChangeCurrentPoll(id) => {
            if id == SUGGESTIONS_POLL_ID {
                state.polls.ensure_thread(&id);
            }
            state.current_poll_id = Some(id);
        }
        Action::SetCommentsLimits(limits) => state.comments_limits = limits,
        Action::SetCommentsOrder(order) => state.comments_order = order,
        Action::SetPath(path) => state.path = path,
        Action::SelectCategory(category) => state.selected_category = category,
        Action::CastVote { poll_id, vote } => state.polls.record_vote(&poll_id, vote),
        Action::UpdateVotes { poll_id, votes } => state.polls.set_votes(&poll_id, votes),
        Action::UpdateCommentsLimit { poll_id, limit } => {
            state.comments_limits.insert(poll_id, limit);
        }
        Action::UpdateComments { poll_id, comments, total } => {
            state.polls.set_comments(&poll_id, comments, total);
        }
        Action::UpdateCommentVotes { poll_id, comment_id, votes, upvotes_count } => {
            state.polls.set_comment_votes(&poll_id, &comment_id, votes, upvotes_count);
        }
        Action::ExpandComment(comment_id) => {
            state.expanded_comments.insert(comment_id);
        }
        Action::AddModal(descriptor) => state.modals.open(descriptor),
        Action::CloseModal(id) => {
            state.modals.close(&id);
        }
        Action::SetUser(user) => {
            state.auth.user = user;
            state.auth.loading = false;
        }
        Action::SetAuthLoading(loading) => state.auth.loading = loading,
        Action::Notify(notice) => push_bounded(&mut state.notices, notice),
        Action::HandleError(message) => push_bounded(&mut state.notices, Notice::error(message)),
        Action::DismissNotice => {
            state.notices.pop_front();
        }
    }
    state
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
