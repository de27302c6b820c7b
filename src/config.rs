//! Application configuration parsed from environment variables.

use std::path::PathBuf;

use url::Url;

use crate::error::ErrorCode;
use crate::validate::CommentRules;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_COMMENTS_PAGE_SIZE: u32 = 5;
pub const DEFAULT_HIDE_AFTER_DISLIKES: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid SONDAJ_BASE_URL {value}: {source}")]
    InvalidBaseUrl { value: String, source: url::ParseError },
    #[error("{key} must be positive")]
    NotPositive { key: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl { .. } => "E_CONFIG_BASE_URL",
            Self::NotPositive { .. } => "E_CONFIG_NOT_POSITIVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Account allowed to add, edit and delete polls.
    pub admin_email: Option<String>,
    /// Comments shown per page and added by each "load more".
    pub comments_page_size: u32,
    pub comment_rules: CommentRules,
    /// Comments with more dislikes than this start collapsed.
    pub hide_after_dislikes: u64,
    /// Page URL the view state is written into and share links point at.
    pub base_url: Url,
    /// Where the consent flag is persisted; in memory when absent.
    pub consent_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let rules = CommentRules::default();
        Self {
            admin_email: None,
            comments_page_size: DEFAULT_COMMENTS_PAGE_SIZE,
            comment_rules: rules,
            hide_after_dislikes: DEFAULT_HIDE_AFTER_DISLIKES,
            base_url: default_base_url(),
            consent_file: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `SONDAJ_ADMIN_EMAIL`: administrator account
    /// - `SONDAJ_COMMENTS_PAGE_SIZE`: default 5
    /// - `SONDAJ_COMMENT_MIN_CHARS`: default 3
    /// - `SONDAJ_COMMENT_MAX_CHARS`: default 5000
    /// - `SONDAJ_HIDE_AFTER_DISLIKES`: default 10
    /// - `SONDAJ_BASE_URL`: default `http://localhost:3000/`
    /// - `SONDAJ_CONSENT_FILE`: consent kept in memory when absent
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid base URL or a zero page size.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let comments_page_size = parse("SONDAJ_COMMENTS_PAGE_SIZE")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(defaults.comments_page_size);
        if comments_page_size == 0 {
            return Err(ConfigError::NotPositive { key: "SONDAJ_COMMENTS_PAGE_SIZE" });
        }
        let comment_rules = CommentRules {
            min_chars: parse("SONDAJ_COMMENT_MIN_CHARS")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.comment_rules.min_chars),
            max_chars: parse("SONDAJ_COMMENT_MAX_CHARS")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.comment_rules.max_chars),
        };
        let hide_after_dislikes =
            parse("SONDAJ_HIDE_AFTER_DISLIKES").unwrap_or(defaults.hide_after_dislikes);

        let base_url = match lookup("SONDAJ_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(value) => Url::parse(value.trim())
                .map_err(|source| ConfigError::InvalidBaseUrl { value, source })?,
            None => defaults.base_url,
        };

        Ok(Self {
            admin_email: lookup("SONDAJ_ADMIN_EMAIL").filter(|v| !v.trim().is_empty()),
            comments_page_size,
            comment_rules,
            hide_after_dislikes,
            base_url,
            consent_file: lookup("SONDAJ_CONSENT_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}
