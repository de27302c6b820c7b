//! View state kept in the page URL query string.
//!
//! DESIGN
//! ======
//! Four parameters survive reloads and make views shareable:
//!
//! - `tipSondaj`: selected category tab
//! - `sondaj`: open poll, as a slug of its name (spaces become `-`)
//! - `commentsLimit`: how many comments the open poll shows
//! - `action`: open header modal, as a slug of its header
//!
//! Writes replace a parameter in place and keep every other parameter.

use url::Url;

use crate::types::Category;

pub const PARAM_CATEGORY: &str = "tipSondaj";
pub const PARAM_POLL: &str = "sondaj";
pub const PARAM_COMMENTS_LIMIT: &str = "commentsLimit";
pub const PARAM_ACTION: &str = "action";

/// Header modals that can be opened from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    Login,
    Suggestions,
    Terms,
}

impl ModalAction {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Login => "autentificare",
            Self::Suggestions => "sugestii",
            Self::Terms => "termeni-si-conditii",
        }
    }

    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        [Self::Login, Self::Suggestions, Self::Terms]
            .into_iter()
            .find(|a| a.slug() == slug)
    }
}

/// Parsed view parameters. Unrecognized values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub category: Option<Category>,
    pub poll_slug: Option<String>,
    pub comments_limit: Option<u32>,
    pub action: Option<ModalAction>,
}

impl ViewState {
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self {
            category: param(url, PARAM_CATEGORY).and_then(|v| Category::parse(&v)),
            poll_slug: param(url, PARAM_POLL).filter(|v| !v.is_empty()),
            comments_limit: param(url, PARAM_COMMENTS_LIMIT)
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0),
            action: param(url, PARAM_ACTION).and_then(|v| ModalAction::parse(&v)),
        }
    }
}

/// First value of `key`, decoded.
#[must_use]
pub fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

/// Set `key` to `value`: the first occurrence is replaced in place, later
/// duplicates are removed, and a missing key is appended.
pub fn set_param(url: &mut Url, key: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (k, v) in url.query_pairs() {
        if k == key {
            if !replaced {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }
    write_pairs(url, &pairs);
}

/// Remove every occurrence of each key.
pub fn remove_params(url: &mut Url, keys: &[&str]) {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !keys.iter().any(|key| k == key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    write_pairs(url, &pairs);
}

fn write_pairs(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// URL slug of a poll name.
#[must_use]
pub fn poll_slug(name: &str) -> String {
    name.trim().replace(' ', "-")
}

/// Whether a URL slug refers to the poll called `name`: the de-slugged
/// value equals the name or the lowercased name.
#[must_use]
pub fn slug_matches(slug: &str, name: &str) -> bool {
    let wanted = slug.replace('-', " ");
    let name = name.trim().replace('-', " ");
    wanted == name || wanted == name.to_lowercase()
}

/// `action` slug for a modal header: lowercased, spaces become `-`.
#[must_use]
pub fn action_slug(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parses_all_parameters() {
        let u = url("https://x.ro/?tipSondaj=lege&sondaj=Legea-Educatiei&commentsLimit=15&action=sugestii");
        let view = ViewState::from_url(&u);
        assert_eq!(view.category, Some(Category::Law));
        assert_eq!(view.poll_slug.as_deref(), Some("Legea-Educatiei"));
        assert_eq!(view.comments_limit, Some(15));
        assert_eq!(view.action, Some(ModalAction::Suggestions));
    }

    #[test]
    fn unknown_values_are_ignored() {
        let u = url("https://x.ro/?tipSondaj=sport&commentsLimit=abc&action=delete-all");
        assert_eq!(ViewState::from_url(&u), ViewState::default());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut u = url("https://x.ro/?a=1&sondaj=old&b=2&sondaj=dup");
        set_param(&mut u, PARAM_POLL, "Ion-Popescu");
        assert_eq!(u.query(), Some("a=1&sondaj=Ion-Popescu&b=2"));
    }

    #[test]
    fn set_appends_missing() {
        let mut u = url("https://x.ro/");
        set_param(&mut u, PARAM_COMMENTS_LIMIT, "10");
        assert_eq!(u.as_str(), "https://x.ro/?commentsLimit=10");
    }

    #[test]
    fn remove_keeps_other_params() {
        let mut u = url("https://x.ro/?tipSondaj=lege&sondaj=X&commentsLimit=10");
        remove_params(&mut u, &[PARAM_POLL, PARAM_COMMENTS_LIMIT]);
        assert_eq!(u.as_str(), "https://x.ro/?tipSondaj=lege");
        remove_params(&mut u, &[PARAM_CATEGORY]);
        assert_eq!(u.as_str(), "https://x.ro/");
    }

    #[test]
    fn slugs() {
        assert_eq!(poll_slug("Ion Popescu"), "Ion-Popescu");
        assert!(slug_matches("Ion-Popescu", "Ion Popescu"));
        assert!(!slug_matches("Ion-Popescu", "Ion Pop"));
        assert!(slug_matches("ion-popescu", "Ion Popescu"));
        assert!(!slug_matches("ION-POPESCU", "Ion Popescu"));
        assert_eq!(action_slug("Termeni si Conditii"), "termeni-si-conditii");
        assert_eq!(ModalAction::parse(&action_slug("Autentificare")), Some(ModalAction::Login));
    }

    #[test]
    fn diacritics_survive_encoding() {
        let mut u = url("https://x.ro/");
        set_param(&mut u, PARAM_POLL, "Legea-Învățământului");
        assert_eq!(
            ViewState::from_url(&u).poll_slug.as_deref(),
            Some("Legea-Învățământului")
        );
    }
}
