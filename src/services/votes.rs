//! Poll votes: one document per user under `sondaje/{poll}/voturi/{uid}`.
//!
//! The user id is the document id, so a second vote by the same user
//! overwrites the first instead of adding another.

use tracing::{info, warn};

use crate::backend::{DocumentStore, Snapshot, StoreError, paths, to_data};
use crate::types::Vote;
use crate::util::now_ms;

/// Upsert `uid`'s vote on a poll.
///
/// # Errors
///
/// Returns the store error when the write fails.
pub async fn save_vote(
    store: &dyn DocumentStore,
    poll_id: &str,
    uid: &str,
    choice: bool,
) -> Result<Vote, StoreError> {
    let vote = Vote { uid: uid.to_string(), choice, timestamp: now_ms() };
    store.set(&paths::vote(poll_id, uid), to_data(&vote)?, true).await?;
    info!(%poll_id, %uid, choice, "vote saved");
    Ok(vote)
}

/// Decode a votes snapshot. Malformed documents are skipped.
#[must_use]
pub fn votes_from_snapshot(snapshot: &Snapshot) -> Vec<Vote> {
    snapshot
        .docs
        .iter()
        .filter_map(|doc| match doc.decode::<Vote>() {
            Ok(mut vote) => {
                vote.uid.clone_from(&doc.id);
                Some(vote)
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed vote");
                None
            }
        })
        .collect()
}
