//! Identity provider: popup sign-in and an observable session.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::error::ErrorCode;
use crate::types::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("sign-in popup was closed")]
    PopupClosed,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("sign-in rejected: {0}")]
    Rejected(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PopupClosed => "E_POPUP_CLOSED",
            Self::Unavailable(_) => "E_AUTH_UNAVAILABLE",
            Self::Rejected(_) => "E_AUTH_REJECTED",
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_popup(&self) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<User>;

    /// Session changes. The receiver starts at the current session.
    fn observe(&self) -> watch::Receiver<Option<User>>;
}

/// What the next popup sign-in does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupOutcome {
    SignIn(User),
    Close,
    Fail(AuthError),
}

/// Scripted identity provider. Cloning shares the session.
#[derive(Clone)]
pub struct MemoryIdentity {
    session: Arc<watch::Sender<Option<User>>>,
    popup: Arc<Mutex<PopupOutcome>>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    /// Signed out; the popup is closed unless scripted otherwise.
    #[must_use]
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self { session: Arc::new(session), popup: Arc::new(Mutex::new(PopupOutcome::Close)) }
    }

    /// Popup signs in as `user`.
    #[must_use]
    pub fn with_user(user: User) -> Self {
        let identity = Self::new();
        identity.set_popup(PopupOutcome::SignIn(user));
        identity
    }

    pub fn set_popup(&self, outcome: PopupOutcome) {
        *self.popup.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    /// Change the session as if it were restored or expired elsewhere.
    pub fn force_session(&self, user: Option<User>) {
        self.session.send_replace(user);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in_with_popup(&self) -> Result<User, AuthError> {
        let outcome = self.popup.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match outcome {
            PopupOutcome::SignIn(user) => {
                info!(uid = %user.uid, "signed in");
                self.session.send_replace(Some(user.clone()));
                Ok(user)
            }
            PopupOutcome::Close => Err(AuthError::PopupClosed),
            PopupOutcome::Fail(err) => Err(err),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.session.send_replace(None) {
            info!(uid = %user.uid, "signed out");
        }
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn observe(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> User {
        User { uid: "u-ana".into(), display_name: Some("Ana".into()), ..User::default() }
    }

    #[tokio::test]
    async fn popup_sign_in_updates_session() {
        let identity = MemoryIdentity::with_user(ana());
        let mut rx = identity.observe();
        assert!(rx.borrow_and_update().is_none());

        let user = identity.sign_in_with_popup().await.unwrap();
        assert_eq!(user.uid, "u-ana");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|u| u.uid.as_str()), Some("u-ana"));
        assert_eq!(identity.current_user(), Some(ana()));
    }

    #[tokio::test]
    async fn closed_popup_is_an_error() {
        let identity = MemoryIdentity::new();
        assert_eq!(identity.sign_in_with_popup().await, Err(AuthError::PopupClosed));
        assert!(identity.current_user().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let identity = MemoryIdentity::new();
        identity.force_session(Some(ana()));
        identity.sign_out().await.unwrap();
        assert!(identity.current_user().is_none());
    }

    #[tokio::test]
    async fn scripted_failure() {
        let identity = MemoryIdentity::new();
        identity.set_popup(PopupOutcome::Fail(AuthError::Unavailable("offline".into())));
        let err = identity.sign_in_with_popup().await.unwrap_err();
        assert_eq!(err.error_code(), "E_AUTH_UNAVAILABLE");
    }
}
