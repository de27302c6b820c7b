//! Backend seams: document store, identity, blob storage.
//!
//! ARCHITECTURE
//! ============
//! The app talks to three hosted services through traits:
//!
//! - `DocumentStore`: hierarchical collections of JSON documents with merge
//!   writes, single-document transactions, server-side counts and live
//!   query subscriptions.
//! - `identity::IdentityProvider`: popup sign-in and an observable session.
//! - `storage::BlobStorage`: image upload with progress and download URLs.
//!
//! DESIGN
//! ======
//! Subscriptions hand out a `watch::Receiver<Snapshot>`: the receiver always
//! sees the latest full result of its query, never a diff. Unsubscribing is
//! synchronous so a caller that replaces a subscription knows the old one
//! will not publish again.

pub mod identity;
pub mod memory;
pub mod paths;
pub mod storage;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::ErrorCode;
use crate::types::SortDirection;

// =============================================================================
// TYPES
// =============================================================================

/// Document payload. Alias to reduce noise in signatures.
pub type Data = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("malformed document {path}: {source}")]
    Decode { path: String, source: serde_json::Error },
    #[error("document encode error: {0}")]
    Encode(serde_json::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
            Self::PermissionDenied(_) => "E_PERMISSION_DENIED",
            Self::InvalidPath(_) => "E_INVALID_PATH",
            Self::Decode { .. } => "E_DECODE",
            Self::Encode(_) => "E_ENCODE",
        }
    }
}

/// One document from a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub data: Value,
}

impl Document {
    /// Decode the payload into a typed record.
    ///
    /// # Errors
    ///
    /// Returns `Decode` when the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone())
            .map_err(|source| StoreError::Decode { path: self.path.clone(), source })
    }
}

/// Encode a record as a document payload.
///
/// # Errors
///
/// Returns `Encode` when `value` does not serialize to a JSON object.
pub fn to_data<T: Serialize>(value: &T) -> Result<Data, StoreError> {
    match serde_json::to_value(value).map_err(StoreError::Encode)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode(serde::de::Error::custom(format!(
            "expected object, got {other}"
        )))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// A collection query: optional single-field ordering and a result limit.
/// Ordering by a field excludes documents that lack it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub collection: String,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self { collection: path.into(), order_by: None, limit: None }
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy { field: field.into(), direction });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Full result of a query at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub docs: Vec<Document>,
}

pub type SubscriptionId = u64;

/// A live query. The receiver holds the initial result immediately.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub snapshots: watch::Receiver<Snapshot>,
}

/// Outcome of a transaction body.
#[derive(Debug, Clone, PartialEq)]
pub enum TxDecision {
    /// Merge these fields into the document.
    Write(Data),
    /// Leave the document untouched.
    Abort,
}

/// Transaction body: sees the current document (if any) and decides.
pub type TxBody<'a> = &'a (dyn Fn(Option<&Value>) -> TxDecision + Send + Sync);

// =============================================================================
// DOCUMENT STORE
// =============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Add a document with a generated id; returns the id.
    async fn add(&self, collection: &str, data: Data) -> Result<String, StoreError>;

    /// Write a document. With `merge`, nested objects are merged into the
    /// existing document instead of replacing it.
    async fn set(&self, path: &str, data: Data, merge: bool) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Server-side document count of a collection.
    async fn count(&self, collection: &str) -> Result<u64, StoreError>;

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;

    /// Stop a subscription. No snapshot is published for it afterwards.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Atomic read-modify-write of one document. Returns the document after
    /// the write, or `None` when the body aborted.
    async fn transact(&self, path: &str, body: TxBody<'_>) -> Result<Option<Value>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_data_requires_object() {
        assert!(to_data(&json!({"a": 1})).is_ok());
        assert!(matches!(to_data(&json!(3)), Err(StoreError::Encode(_))));
    }

    #[test]
    fn decode_failure_names_path() {
        let doc = Document { id: "x".into(), path: "sondaje/x".into(), data: json!({"nume": 5}) };
        let err = doc.decode::<crate::types::Poll>().unwrap_err();
        assert!(err.to_string().contains("sondaje/x"));
    }

    #[test]
    fn query_builder() {
        let q = Query::collection("a").order_by("timestamp", SortDirection::Desc).limit(5);
        assert_eq!(q.limit, Some(5));
        assert_eq!(q.order_by.unwrap().field, "timestamp");
    }
}
