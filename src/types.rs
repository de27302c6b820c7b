//! Domain records: polls, votes, comments, users.
//!
//! DESIGN
//! ======
//! Field names on the wire are the document keys the poll collections have
//! always used (`nume`, `tipSondaj`, `vot`, `comentariu`, ...). Rust names are
//! English; serde renames bridge the two. Document ids are not part of the
//! stored payload: they are filled in from the document path after decoding.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// CATEGORY
// =============================================================================

/// Poll category. Unknown stored values decode as `Other`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "persoana")]
    Person,
    #[serde(rename = "partid")]
    Party,
    #[serde(rename = "lege")]
    Law,
    #[serde(rename = "altele", other)]
    Other,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Person, Self::Party, Self::Law, Self::Other];

    /// Stored and URL form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "persoana",
            Self::Party => "partid",
            Self::Law => "lege",
            Self::Other => "altele",
        }
    }

    /// Tab label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Persoane",
            Self::Party => "Partide",
            Self::Law => "Legi",
            Self::Other => "Altele",
        }
    }

    /// Strict parse of the stored form. Returns `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// POLL
// =============================================================================

/// A poll subject. `votes` and `comments` are populated by live
/// subscriptions for the poll currently in view only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "nume")]
    pub name: String,
    #[serde(rename = "pozitie", default)]
    pub position: String,
    #[serde(rename = "detalii", default)]
    pub details: String,
    #[serde(rename = "sursa", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "poza", default)]
    pub image: String,
    #[serde(rename = "tipSondaj", default)]
    pub category: Category,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip)]
    pub votes: Option<Vec<Vote>>,
    #[serde(skip)]
    pub comments: Option<Vec<Comment>>,
    #[serde(skip)]
    pub comments_count: Option<u64>,
}

impl Poll {
    /// `name - position`, or just the name when there is no position.
    #[must_use]
    pub fn title(&self) -> String {
        if self.position.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.position)
        }
    }

    /// Source link, if one is set and non-blank.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Most recent of `updatedAt`, `createdAt`, `timestamp`.
    #[must_use]
    pub fn last_modified(&self) -> i64 {
        self.updated_at.or(self.created_at).unwrap_or(self.timestamp)
    }
}

/// Fields an administrator edits. The image is supplied separately.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollDraft {
    pub name: String,
    pub position: String,
    pub details: String,
    pub source: String,
    pub category: Category,
}

impl PollDraft {
    /// Draft pre-filled from an existing poll, for editing.
    #[must_use]
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            name: poll.name.clone(),
            position: poll.position.clone(),
            details: poll.details.clone(),
            source: poll.source.clone().unwrap_or_default(),
            category: poll.category,
        }
    }
}

/// Poll image: either keep a stored URL or upload new bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageInput {
    Existing(String),
    Upload(ImageUpload),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// VOTES
// =============================================================================

/// One user's up/down vote on a poll. Stored at `sondaje/{poll}/voturi/{uid}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(default, skip_serializing)]
    pub uid: String,
    #[serde(rename = "vot")]
    pub choice: bool,
    #[serde(default)]
    pub timestamp: i64,
}

// =============================================================================
// COMMENTS
// =============================================================================

/// A comment on a poll. Reactions live inline in `votes`, keyed by uid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub uid: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "comentariu")]
    pub text: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub votes: BTreeMap<String, CommentVote>,
    #[serde(rename = "upvotesCount", default)]
    pub upvotes_count: u64,
}

impl Comment {
    #[must_use]
    pub fn author(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Anonim")
    }
}

/// A like (`true`) or dislike (`false`) on a comment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentVote {
    #[serde(rename = "vot")]
    pub like: bool,
    #[serde(default)]
    pub timestamp: i64,
}

/// Field a comment list is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentSortField {
    #[default]
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "upvotesCount")]
    Upvotes,
}

impl CommentSortField {
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Upvotes => "upvotesCount",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Comment ordering. Defaults to newest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentOrder {
    pub field: CommentSortField,
    pub direction: SortDirection,
}

impl CommentOrder {
    pub const NEWEST: Self = Self { field: CommentSortField::Timestamp, direction: SortDirection::Desc };
    pub const OLDEST: Self = Self { field: CommentSortField::Timestamp, direction: SortDirection::Asc };
    pub const TOP: Self = Self { field: CommentSortField::Upvotes, direction: SortDirection::Desc };
}

// =============================================================================
// USERS
// =============================================================================

/// Signed-in identity as reported by the identity provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "emailVerified", default)]
    pub email_verified: bool,
}

/// Profile record merged into `users/{uid}` on every sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
    #[serde(rename = "lastSignInTime")]
    pub last_sign_in: i64,
}

impl UserProfile {
    #[must_use]
    pub fn from_user(user: &User, signed_in_at: i64) -> Self {
        Self {
            uid: user.uid.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
            email_verified: user.email_verified,
            last_sign_in: signed_in_at,
        }
    }
}

impl From<UserProfile> for User {
    fn from(profile: UserProfile) -> Self {
        Self {
            uid: profile.uid,
            display_name: profile.display_name,
            email: profile.email,
            photo_url: profile.photo_url,
            email_verified: profile.email_verified,
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
