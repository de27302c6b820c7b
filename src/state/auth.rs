//! Session state.

use crate::types::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    /// True until the identity provider reports the first session.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl AuthState {
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Whether `user` is the configured administrator.
#[must_use]
pub fn is_admin(user: Option<&User>, admin_email: Option<&str>) -> bool {
    match (user.and_then(|u| u.email.as_deref()), admin_email) {
        (Some(email), Some(admin)) => email.eq_ignore_ascii_case(admin),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>) -> User {
        User { uid: "u1".into(), email: email.map(str::to_string), ..User::default() }
    }

    #[test]
    fn starts_loading_and_signed_out() {
        let auth = AuthState::default();
        assert!(auth.loading);
        assert!(!auth.is_signed_in());
        assert_eq!(auth.uid(), None);
    }

    #[test]
    fn admin_matches_configured_email() {
        let admin = user(Some("Admin@Sondaj.ro"));
        assert!(is_admin(Some(&admin), Some("admin@sondaj.ro")));
        assert!(!is_admin(Some(&user(Some("x@y.ro"))), Some("admin@sondaj.ro")));
        assert!(!is_admin(Some(&admin), None));
        assert!(!is_admin(Some(&user(None)), Some("admin@sondaj.ro")));
        assert!(!is_admin(None, Some("admin@sondaj.ro")));
    }
}
