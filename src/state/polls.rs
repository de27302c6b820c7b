//! Poll list state: the flat list plus a per-category index.

use std::collections::BTreeMap;

use crate::types::{Category, Comment, CommentVote, Poll, Vote};
use crate::view_state::slug_matches;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollsData {
    /// Display order (shuffled on each load).
    pub flat: Vec<Poll>,
    /// Poll ids per category, in display order.
    pub grouped: BTreeMap<Category, Vec<String>>,
    /// Comment threads with no poll document behind them (suggestions).
    pub threads: BTreeMap<String, Poll>,
}

impl PollsData {
    #[must_use]
    pub fn from_polls(flat: Vec<Poll>) -> Self {
        let mut grouped: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for poll in &flat {
            grouped.entry(poll.category).or_default().push(poll.id.clone());
        }
        Self { flat, grouped, threads: BTreeMap::new() }
    }

    #[must_use]
    pub fn get(&self, poll_id: &str) -> Option<&Poll> {
        self.flat.iter().find(|p| p.id == poll_id).or_else(|| self.threads.get(poll_id))
    }

    pub fn get_mut(&mut self, poll_id: &str) -> Option<&mut Poll> {
        match self.flat.iter_mut().find(|p| p.id == poll_id) {
            Some(poll) => Some(poll),
            None => self.threads.get_mut(poll_id),
        }
    }

    /// Make sure a standalone comment thread exists for `id`.
    pub fn ensure_thread(&mut self, id: &str) {
        self.threads
            .entry(id.to_string())
            .or_insert_with(|| Poll { id: id.to_string(), ..Poll::default() });
    }

    /// Polls of one category, in display order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Poll> {
        self.flat.iter().filter(move |p| p.category == category)
    }

    /// Poll whose name matches a URL slug.
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&Poll> {
        self.flat.iter().find(|p| slug_matches(slug, &p.name))
    }

    /// Keep votes and comments already loaded for polls still present.
    /// Poll documents carry neither; they come from their own subscriptions.
    pub fn carry_live_fields(&mut self, previous: &PollsData) {
        for poll in &mut self.flat {
            if let Some(old) = previous.get(&poll.id) {
                poll.votes.clone_from(&old.votes);
                poll.comments.clone_from(&old.comments);
                poll.comments_count = old.comments_count;
            }
        }
        for (id, thread) in &previous.threads {
            self.threads.entry(id.clone()).or_insert_with(|| thread.clone());
        }
    }

    /// Insert or replace one user's vote. Ignored until the poll's votes
    /// have loaded; a partial list would misstate the tally.
    pub fn record_vote(&mut self, poll_id: &str, vote: Vote) {
        let Some(votes) = self.get_mut(poll_id).and_then(|p| p.votes.as_mut()) else { return };
        votes.retain(|v| v.uid != vote.uid);
        votes.push(vote);
    }

    pub fn set_votes(&mut self, poll_id: &str, votes: Vec<Vote>) {
        if let Some(poll) = self.get_mut(poll_id) {
            poll.votes = Some(votes);
        }
    }

    pub fn set_comments(&mut self, poll_id: &str, comments: Vec<Comment>, total: u64) {
        if let Some(poll) = self.get_mut(poll_id) {
            poll.comments = Some(comments);
            poll.comments_count = Some(total);
        }
    }

    pub fn set_comment_votes(
        &mut self,
        poll_id: &str,
        comment_id: &str,
        votes: BTreeMap<String, CommentVote>,
        upvotes_count: u64,
    ) {
        let Some(comment) = self
            .get_mut(poll_id)
            .and_then(|p| p.comments.as_mut())
            .and_then(|cs| cs.iter_mut().find(|c| c.id == comment_id))
        else {
            return;
        };
        comment.votes = votes;
        comment.upvotes_count = upvotes_count;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(id: &str, name: &str, category: Category) -> Poll {
        Poll { id: id.into(), name: name.into(), category, ..Poll::default() }
    }

    fn sample() -> PollsData {
        PollsData::from_polls(vec![
            poll("p1", "Ion Popescu", Category::Person),
            poll("p2", "Partidul Verde", Category::Party),
            poll("p3", "Maria Ionescu", Category::Person),
        ])
    }

    #[test]
    fn groups_by_category_in_order() {
        let data = sample();
        assert_eq!(data.grouped[&Category::Person], ["p1", "p3"]);
        assert_eq!(data.grouped[&Category::Party], ["p2"]);
        assert!(!data.grouped.contains_key(&Category::Law));
        let names: Vec<&str> = data.in_category(Category::Person).map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ion Popescu", "Maria Ionescu"]);
    }

    #[test]
    fn finds_by_slug() {
        let data = sample();
        assert_eq!(data.find_by_slug("Partidul-Verde").unwrap().id, "p2");
        assert!(data.find_by_slug("Nimeni").is_none());
    }

    #[test]
    fn record_vote_overwrites_same_user() {
        let mut data = sample();
        data.set_votes("p1", vec![]);
        data.record_vote("p1", Vote { uid: "u1".into(), choice: true, timestamp: 1 });
        data.record_vote("p1", Vote { uid: "u1".into(), choice: false, timestamp: 2 });
        data.record_vote("p1", Vote { uid: "u2".into(), choice: true, timestamp: 3 });
        let votes = data.get("p1").unwrap().votes.as_ref().unwrap();
        assert_eq!(votes.len(), 2);
        assert!(!votes.iter().find(|v| v.uid == "u1").unwrap().choice);
    }

    #[test]
    fn record_vote_waits_for_loaded_votes() {
        let mut data = sample();
        data.record_vote("p1", Vote { uid: "u1".into(), choice: true, timestamp: 1 });
        assert!(data.get("p1").unwrap().votes.is_none());
    }

    #[test]
    fn carry_live_fields_keeps_loaded_comments() {
        let mut old = sample();
        old.set_comments("p1", vec![Comment { id: "c1".into(), ..Comment::default() }], 7);
        let mut fresh = PollsData::from_polls(vec![poll("p1", "Ion Popescu", Category::Person)]);
        fresh.carry_live_fields(&old);
        let p1 = fresh.get("p1").unwrap();
        assert_eq!(p1.comments.as_ref().unwrap().len(), 1);
        assert_eq!(p1.comments_count, Some(7));
    }

    #[test]
    fn comment_votes_update_in_place() {
        let mut data = sample();
        data.set_comments("p1", vec![Comment { id: "c1".into(), ..Comment::default() }], 1);
        let votes = BTreeMap::from([("u1".to_string(), CommentVote { like: true, timestamp: 1 })]);
        data.set_comment_votes("p1", "c1", votes, 1);
        let comment = &data.get("p1").unwrap().comments.as_ref().unwrap()[0];
        assert_eq!(comment.upvotes_count, 1);
        assert!(comment.votes["u1"].like);
    }

    #[test]
    fn threads_hold_comments_without_a_poll() {
        let mut data = sample();
        data.ensure_thread("sugestii");
        data.set_comments("sugestii", vec![Comment { id: "c1".into(), ..Comment::default() }], 1);
        assert_eq!(data.len(), 3);
        assert_eq!(data.get("sugestii").unwrap().comments_count, Some(1));

        let mut fresh = sample();
        fresh.carry_live_fields(&data);
        assert_eq!(fresh.get("sugestii").unwrap().comments.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn updates_for_unknown_poll_are_ignored() {
        let mut data = sample();
        data.set_votes("zzz", vec![Vote::default()]);
        data.record_vote("zzz", Vote::default());
        assert_eq!(data, sample());
    }
}
