//! Document paths.
//!
//! Collections live at odd segment counts (`sondaje`, `sondaje/p1/voturi`),
//! documents at even ones (`sondaje/p1`, `sondaje/p1/voturi/u1`).

use super::StoreError;

pub const POLLS: &str = "sondaje";
pub const USERS: &str = "users";
pub const IMAGES: &str = "images";
const VOTES: &str = "voturi";
const COMMENTS: &str = "comentarii";

/// Pseudo-poll whose comment thread collects suggestions.
pub const SUGGESTIONS_POLL_ID: &str = "sugestii";

#[must_use]
pub fn poll(poll_id: &str) -> String {
    format!("{POLLS}/{poll_id}")
}

#[must_use]
pub fn votes(poll_id: &str) -> String {
    format!("{POLLS}/{poll_id}/{VOTES}")
}

#[must_use]
pub fn vote(poll_id: &str, uid: &str) -> String {
    format!("{POLLS}/{poll_id}/{VOTES}/{uid}")
}

#[must_use]
pub fn comments(poll_id: &str) -> String {
    format!("{POLLS}/{poll_id}/{COMMENTS}")
}

#[must_use]
pub fn comment(poll_id: &str, comment_id: &str) -> String {
    format!("{POLLS}/{poll_id}/{COMMENTS}/{comment_id}")
}

#[must_use]
pub fn user(uid: &str) -> String {
    format!("{USERS}/{uid}")
}

#[must_use]
pub fn image(file_name: &str) -> String {
    format!("{IMAGES}/{file_name}")
}

fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Split a document path into `(collection, id)`.
///
/// # Errors
///
/// `InvalidPath` for empty segments or a collection path.
pub fn split_document(path: &str) -> Result<(&str, &str), StoreError> {
    let parts = segments(path)?;
    if parts.len() % 2 != 0 {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    path.rsplit_once('/')
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
}

/// # Errors
///
/// `InvalidPath` for empty segments or a document path.
pub fn check_collection(path: &str) -> Result<(), StoreError> {
    let parts = segments(path)?;
    if parts.len() % 2 == 0 {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths() {
        assert_eq!(vote("p1", "u1"), "sondaje/p1/voturi/u1");
        assert_eq!(comment("p1", "c1"), "sondaje/p1/comentarii/c1");
        assert_eq!(user("u1"), "users/u1");
        assert_eq!(image("a.png"), "images/a.png");
    }

    #[test]
    fn split_document_path() {
        assert_eq!(split_document("sondaje/p1").unwrap(), ("sondaje", "p1"));
        assert_eq!(
            split_document("sondaje/p1/voturi/u1").unwrap(),
            ("sondaje/p1/voturi", "u1")
        );
        assert!(split_document("sondaje").is_err());
        assert!(split_document("sondaje//x").is_err());
    }

    #[test]
    fn collection_paths() {
        assert!(check_collection("sondaje").is_ok());
        assert!(check_collection("sondaje/p1/comentarii").is_ok());
        assert!(check_collection("sondaje/p1").is_err());
        assert!(check_collection("").is_err());
    }
}
