//! Poll documents: list decoding, admin create/edit/delete.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::backend::storage::{BlobStorage, ProgressFn};
use crate::backend::{DocumentStore, Snapshot, paths, to_data};
use crate::error::AppError;
use crate::rich_text::open_links_in_new_tab;
use crate::state::PollsData;
use crate::types::{ImageInput, Poll, PollDraft};
use crate::util::now_ms;

/// Decode the poll collection: details links open in a new tab, display
/// order is shuffled, and polls are indexed by category. Malformed documents
/// are skipped.
pub fn polls_from_snapshot<R: Rng + ?Sized>(snapshot: &Snapshot, rng: &mut R) -> PollsData {
    let mut polls: Vec<Poll> = snapshot
        .docs
        .iter()
        .filter_map(|doc| match doc.decode::<Poll>() {
            Ok(mut poll) => {
                poll.id.clone_from(&doc.id);
                poll.details = open_links_in_new_tab(&poll.details);
                Some(poll)
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed poll");
                None
            }
        })
        .collect();
    polls.shuffle(rng);
    PollsData::from_polls(polls)
}

/// Create a poll (`existing_id` = None) or merge edits into an existing one.
/// A new image is uploaded to `images/{file name}` first and its download
/// URL stored. Returns the poll id.
///
/// # Errors
///
/// Returns the storage or store error; nothing is written when the upload
/// fails.
pub async fn save_poll(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStorage,
    existing_id: Option<&str>,
    draft: &PollDraft,
    image: ImageInput,
    progress: ProgressFn<'_>,
) -> Result<String, AppError> {
    let image_url = match image {
        ImageInput::Existing(url) => url,
        ImageInput::Upload(upload) => {
            let path = paths::image(&upload.file_name);
            blobs.upload(&path, upload.bytes, &upload.content_type, progress).await?;
            blobs.download_url(&path).await?
        }
    };

    let now = now_ms();
    let mut record = Poll {
        name: draft.name.trim().to_string(),
        position: draft.position.trim().to_string(),
        details: draft.details.clone(),
        // Always written so an edit can clear it.
        source: Some(draft.source.trim().to_string()),
        image: image_url,
        category: draft.category,
        timestamp: now,
        ..Poll::default()
    };

    match existing_id {
        Some(id) => {
            record.updated_at = Some(now);
            store.set(&paths::poll(id), to_data(&record)?, true).await?;
            info!(poll_id = %id, name = %record.name, "poll updated");
            Ok(id.to_string())
        }
        None => {
            record.created_at = Some(now);
            let id = store.add(paths::POLLS, to_data(&record)?).await?;
            info!(poll_id = %id, name = %record.name, "poll created");
            Ok(id)
        }
    }
}

/// # Errors
///
/// Returns the store error when the delete fails.
pub async fn delete_poll(store: &dyn DocumentStore, poll_id: &str) -> Result<(), AppError> {
    store.delete(&paths::poll(poll_id)).await?;
    info!(%poll_id, "poll deleted");
    Ok(())
}

#[cfg(test)]
#[path = "polls_test.rs"]
mod tests;
