//! Modal registry: every dialog the app has opened, keyed by id.
//!
//! DESIGN
//! ======
//! Entries are never removed: closing flips `is_open` so reopening keeps the
//! dialog's place in stacking order. Opening an id that already exists reopens
//! it and takes the new header and kind.

use indexmap::IndexMap;

use crate::types::Poll;
use crate::view_state::{PARAM_ACTION, PARAM_COMMENTS_LIMIT, PARAM_POLL};

pub const LOGIN_ID: &str = "login";
pub const TERMS_ID: &str = "terms";
pub const SUGGESTIONS_ID: &str = "sugestii";
pub const ADD_POLL_ID: &str = "add-sondaj";

/// What a modal shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Login,
    Terms,
    Suggestions,
    AddPoll,
    PollDetails { poll_id: String },
    EditPoll { poll_id: String },
}

impl ModalKind {
    /// Query parameters owned by this modal, cleared when it closes.
    #[must_use]
    pub fn url_params(&self) -> &'static [&'static str] {
        match self {
            Self::PollDetails { .. } => &[PARAM_POLL, PARAM_COMMENTS_LIMIT],
            Self::Login | Self::Terms | Self::Suggestions | Self::AddPoll => &[PARAM_ACTION],
            Self::EditPoll { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalDescriptor {
    pub id: String,
    pub header: String,
    pub kind: ModalKind,
    pub is_open: bool,
    /// Whether the user may close it (the consent dialog may not).
    pub dismissable: bool,
    pub hide_close_button: bool,
    /// Whether opening writes `action=<header slug>` into the URL.
    pub replace_url: bool,
}

impl ModalDescriptor {
    fn new(id: impl Into<String>, header: impl Into<String>, kind: ModalKind) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            kind,
            is_open: true,
            dismissable: true,
            hide_close_button: false,
            replace_url: false,
        }
    }

    #[must_use]
    pub fn login() -> Self {
        Self::new(LOGIN_ID, "Autentificare", ModalKind::Login)
    }

    #[must_use]
    pub fn terms() -> Self {
        Self {
            dismissable: false,
            hide_close_button: true,
            ..Self::new(TERMS_ID, "Termeni si Conditii", ModalKind::Terms)
        }
    }

    #[must_use]
    pub fn suggestions() -> Self {
        Self::new(SUGGESTIONS_ID, "Sugestii", ModalKind::Suggestions)
    }

    #[must_use]
    pub fn add_poll() -> Self {
        Self::new(ADD_POLL_ID, "Adauga sondaj", ModalKind::AddPoll)
    }

    #[must_use]
    pub fn poll_details(poll: &Poll) -> Self {
        Self::new(
            poll_modal_id(&poll.id),
            poll.title(),
            ModalKind::PollDetails { poll_id: poll.id.clone() },
        )
    }

    #[must_use]
    pub fn edit_poll(poll: &Poll) -> Self {
        Self::new(
            edit_modal_id(&poll.id),
            format!("Editeaza {}", poll.name),
            ModalKind::EditPoll { poll_id: poll.id.clone() },
        )
    }

    /// Also write the `action` parameter when opened.
    #[must_use]
    pub fn with_action_param(mut self) -> Self {
        self.replace_url = true;
        self
    }
}

#[must_use]
pub fn poll_modal_id(poll_id: &str) -> String {
    format!("sondaj-{poll_id}")
}

#[must_use]
pub fn edit_modal_id(poll_id: &str) -> String {
    format!("edit-{poll_id}")
}

/// Insertion-ordered modal registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalRegistry {
    entries: IndexMap<String, ModalDescriptor>,
}

impl ModalRegistry {
    /// Open a modal, or reopen an existing id with the new header and kind.
    pub fn open(&mut self, descriptor: ModalDescriptor) {
        let mut descriptor = descriptor;
        descriptor.is_open = true;
        match self.entries.get_mut(&descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => {
                self.entries.insert(descriptor.id.clone(), descriptor);
            }
        }
    }

    /// Close by id. Returns false for an unknown id.
    pub fn close(&mut self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.is_open = false;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModalDescriptor> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn is_open(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|m| m.is_open)
    }

    /// Open modals, in the order they were first opened.
    pub fn open_modals(&self) -> impl Iterator<Item = &ModalDescriptor> {
        self.entries.values().filter(|m| m.is_open)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
