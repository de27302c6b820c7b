//! Rich-text helpers for poll details (stored as HTML).

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a(\s[^>]*)?>").expect("anchor regex"));

static TARGET_OR_REL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+(?:target|rel)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("attribute regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("tag regex"));

/// Make every link open in a new tab: each `<a>` gets
/// `target="_blank" rel="noopener noreferrer"`, replacing existing values.
#[must_use]
pub fn open_links_in_new_tab(html: &str) -> String {
    ANCHOR_OPEN
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let attrs = TARGET_OR_REL.replace_all(attrs, "");
            let attrs = attrs.trim_end().trim_end_matches('/').trim_end();
            format!(r#"<a{attrs} target="_blank" rel="noopener noreferrer">"#)
        })
        .into_owned()
}

/// Plain-text summary: first paragraph with tags stripped and `&nbsp;`
/// turned into spaces.
#[must_use]
pub fn summary(html: &str) -> String {
    let first = html.split("</p>").next().unwrap_or_default();
    TAG.replace_all(first, "").replace("&nbsp;", " ").trim().to_string()
}
