use super::*;
use crate::notify::NoticeLevel;
use crate::state::modal::LOGIN_ID;
use crate::types::Poll;

fn loaded() -> AppState {
    let polls = PollsData::from_polls(vec![
        Poll { id: "p1".into(), name: "Ion".into(), ..Poll::default() },
        Poll { id: "p2".into(), name: "Lege".into(), category: Category::Law, ..Poll::default() },
    ]);
    reduce(AppState::default(), Action::SetPolls(polls))
}

fn vote(uid: &str, choice: bool) -> Vote {
    Vote { uid: uid.into(), choice, timestamp: 0 }
}

#[test]
fn set_polls_marks_loaded() {
    let state = loaded();
    assert!(state.polls_loaded);
    assert_eq!(state.polls.len(), 2);
}

#[test]
fn revote_overwrites_instead_of_duplicating() {
    let mut state = reduce(loaded(), Action::UpdateVotes { poll_id: "p1".into(), votes: vec![vote("u2", true)] });
    state = reduce(state, Action::CastVote { poll_id: "p1".into(), vote: vote("u1", true) });
    state = reduce(state, Action::CastVote { poll_id: "p1".into(), vote: vote("u1", false) });
    let votes = state.polls.get("p1").unwrap().votes.clone().unwrap();
    assert_eq!(votes, vec![vote("u2", true), vote("u1", false)]);
}

#[test]
fn vote_before_votes_load_leaves_poll_unloaded() {
    let state = reduce(loaded(), Action::CastVote { poll_id: "p2".into(), vote: vote("u1", true) });
    assert!(state.polls.get("p2").unwrap().votes.is_none());
    assert!(!crate::views::vote_summary(&state, "p2", Some("u1")).loaded);
}

#[test]
fn change_current_poll() {
    let state = reduce(loaded(), Action::ChangeCurrentPoll("p2".into()));
    assert_eq!(state.current_poll().unwrap().name, "Lege");
    let state = reduce(state, Action::SetCurrentPollId("p1".into()));
    assert_eq!(state.current_poll_id.as_deref(), Some("p1"));
}

#[test]
fn comments_limit_defaults_to_page_size() {
    let state = loaded();
    assert_eq!(state.comments_limit("p1", 5), 5);
    let state = reduce(state, Action::UpdateCommentsLimit { poll_id: "p1".into(), limit: 10 });
    assert_eq!(state.comments_limit("p1", 5), 10);
    assert_eq!(state.comments_limit("p2", 5), 5);
}

#[test]
fn poll_reload_keeps_loaded_comments() {
    let state = reduce(
        loaded(),
        Action::UpdateComments {
            poll_id: "p1".into(),
            comments: vec![Comment { id: "c1".into(), ..Comment::default() }],
            total: 4,
        },
    );
    let fresh = PollsData::from_polls(vec![Poll { id: "p1".into(), name: "Ion".into(), ..Poll::default() }]);
    let state = reduce(state, Action::SetPolls(fresh));
    assert_eq!(state.polls.get("p1").unwrap().comments_count, Some(4));
}

#[test]
fn modal_open_close() {
    let state = reduce(AppState::default(), Action::AddModal(ModalDescriptor::login()));
    assert!(state.modals.is_open(LOGIN_ID));
    let state = reduce(state, Action::CloseModal(LOGIN_ID.into()));
    assert!(!state.modals.is_open(LOGIN_ID));
}

#[test]
fn set_user_ends_loading() {
    let state = AppState::default();
    assert!(state.auth.loading);
    let user = User { uid: "u1".into(), ..User::default() };
    let state = reduce(state, Action::SetUser(Some(user)));
    assert!(!state.auth.loading);
    assert_eq!(state.auth.uid(), Some("u1"));
    let state = reduce(state, Action::SetUser(None));
    assert!(!state.auth.is_signed_in());
}

#[test]
fn handle_error_queues_error_notice() {
    let state = reduce(AppState::default(), Action::HandleError("boom".into()));
    assert_eq!(state.notices.len(), 1);
    assert_eq!(state.notices[0].level, NoticeLevel::Error);
    let state = reduce(state, Action::DismissNotice);
    assert!(state.notices.is_empty());
}

#[test]
fn comment_votes_update() {
    let state = reduce(
        loaded(),
        Action::UpdateComments {
            poll_id: "p1".into(),
            comments: vec![Comment { id: "c1".into(), ..Comment::default() }],
            total: 1,
        },
    );
    let votes = BTreeMap::from([("u9".to_string(), CommentVote { like: false, timestamp: 0 })]);
    let state = reduce(
        state,
        Action::UpdateCommentVotes {
            poll_id: "p1".into(),
            comment_id: "c1".into(),
            votes,
            upvotes_count: 0,
        },
    );
    let comment = &state.polls.get("p1").unwrap().comments.as_ref().unwrap()[0];
    assert!(!comment.votes["u9"].like);
}

#[test]
fn simple_setters() {
    let mut state = AppState::default();
    state = reduce(state, Action::SetPath("/sondaje".into()));
    state = reduce(state, Action::SelectCategory(Category::Party));
    state = reduce(state, Action::SetCommentsOrder(CommentOrder::TOP));
    state = reduce(state, Action::ExpandComment("c1".into()));
    state = reduce(state, Action::SetCommentsLimits(HashMap::from([("p1".to_string(), 15)])));
    assert_eq!(state.path, "/sondaje");
    assert_eq!(state.selected_category, Category::Party);
    assert_eq!(state.comments_order, CommentOrder::TOP);
    assert!(state.expanded_comments.contains("c1"));
    assert_eq!(state.comments_limits["p1"], 15);
}

#[test]
fn suggestions_thread_is_created_on_open() {
    let state = reduce(loaded(), Action::ChangeCurrentPoll(SUGGESTIONS_POLL_ID.into()));
    assert!(state.current_poll().is_some());
    assert_eq!(state.polls.len(), 2);
    let state = reduce(
        state,
        Action::UpdateComments {
            poll_id: SUGGESTIONS_POLL_ID.into(),
            comments: vec![Comment { id: "s1".into(), ..Comment::default() }],
            total: 1,
        },
    );
    assert_eq!(state.current_poll().unwrap().comments_count, Some(1));
}

#[test]
fn auth_loading_toggles() {
    let state = AppState::default();
    assert!(state.auth.loading);
    let state = reduce(state, Action::SetAuthLoading(false));
    assert!(!state.auth.loading);
}
