//! Comments and comment reactions.
//!
//! DESIGN
//! ======
//! Reactions are stored inline on the comment (`votes[uid]`) next to a
//! denormalized `upvotesCount`. Both are written in one transaction so the
//! count always equals the number of likes in the map, even when two users
//! react at once.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::backend::{Data, Document, DocumentStore, Query, Snapshot, TxDecision, paths, to_data};
use crate::error::AppError;
use crate::types::{Comment, CommentOrder, CommentVote, User};
use crate::util::now_ms;

/// Reaction map and like count after a reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionUpdate {
    pub votes: BTreeMap<String, CommentVote>,
    pub upvotes_count: u64,
}

/// Query for the first `limit` comments of a poll in `order`.
#[must_use]
pub fn comments_query(poll_id: &str, order: CommentOrder, limit: u32) -> Query {
    Query::collection(paths::comments(poll_id))
        .order_by(order.field.field(), order.direction)
        .limit(limit as usize)
}

/// Decode a comments snapshot, keeping query order. Malformed documents are
/// skipped.
#[must_use]
pub fn comments_from_snapshot(snapshot: &Snapshot) -> Vec<Comment> {
    snapshot
        .docs
        .iter()
        .filter_map(|doc| match doc.decode::<Comment>() {
            Ok(mut comment) => {
                comment.id.clone_from(&doc.id);
                Some(comment)
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed comment");
                None
            }
        })
        .collect()
}

/// Store an already-validated comment by `author`. Returns the new id.
///
/// # Errors
///
/// Returns the store error when the write fails.
pub async fn add_comment(
    store: &dyn DocumentStore,
    poll_id: &str,
    text: &str,
    author: &User,
) -> Result<String, AppError> {
    let comment = Comment {
        id: String::new(),
        uid: author.uid.clone(),
        display_name: author.display_name.clone(),
        photo_url: author.photo_url.clone(),
        text: text.to_string(),
        timestamp: now_ms(),
        votes: BTreeMap::new(),
        upvotes_count: 0,
    };
    let id = store.add(&paths::comments(poll_id), to_data(&comment)?).await?;
    info!(%poll_id, comment_id = %id, uid = %author.uid, "comment added");
    Ok(id)
}

/// Record `uid`'s like or dislike and recompute `upvotesCount`.
///
/// # Errors
///
/// `CommentNotFound` when the comment does not exist, or the store error.
pub async fn react(
    store: &dyn DocumentStore,
    poll_id: &str,
    comment_id: &str,
    uid: &str,
    like: bool,
) -> Result<ReactionUpdate, AppError> {
    let path = paths::comment(poll_id, comment_id);
    let reacted_at = now_ms();
    let body = |current: Option<&Value>| {
        let Some(current) = current else { return TxDecision::Abort };
        let mut votes = current
            .get("votes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        votes.insert(uid.to_string(), json!({ "vot": like, "timestamp": reacted_at }));
        let upvotes = votes
            .values()
            .filter(|v| v.get("vot").and_then(Value::as_bool) == Some(true))
            .count();
        let mut patch = Data::new();
        patch.insert("votes".into(), Value::Object(votes));
        patch.insert("upvotesCount".into(), json!(upvotes));
        TxDecision::Write(patch)
    };

    let Some(after) = store.transact(&path, &body).await? else {
        return Err(AppError::CommentNotFound(comment_id.to_string()));
    };
    let comment: Comment = Document { id: comment_id.to_string(), path, data: after }.decode()?;
    info!(%poll_id, %comment_id, %uid, like, "comment reaction saved");
    Ok(ReactionUpdate { votes: comment.votes, upvotes_count: comment.upvotes_count })
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
