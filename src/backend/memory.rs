//! In-memory document store with live queries.
//!
//! DESIGN
//! ======
//! All collections sit behind one mutex. Every mutation re-evaluates the
//! queries subscribed to the touched collection and publishes the new result
//! on their watch channel, while still holding the lock, so subscribers see
//! writes in commit order. Transactions run their body under the same lock.
//!
//! `set_offline(true)` makes every call fail with `Unavailable`, which is how
//! tests exercise the error paths.
//!
//! `DataFile` imports and exports the whole store as JSON or YAML.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    Data, Document, DocumentStore, Query, Snapshot, StoreError, Subscription, SubscriptionId,
    TxBody, TxDecision, paths,
};
use crate::types::SortDirection;

/// Document id → payload.
pub type Collection = BTreeMap<String, Value>;

// =============================================================================
// DATA FILE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataFileError {
    #[error("data file io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data file json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("data file yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Whole-store dump: collection path → document id → payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

impl DataFile {
    /// Load a dump; YAML for `.yaml`/`.yml`, JSON otherwise. A missing file
    /// loads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DataFileError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        if is_yaml(path) {
            Ok(serde_yaml::from_str(&raw)?)
        } else {
            Ok(serde_json::from_str(&raw)?)
        }
    }

    /// # Errors
    ///
    /// Returns an error when the dump cannot be encoded or written.
    pub fn save(&self, path: &Path) -> Result<(), DataFileError> {
        let raw = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, raw)?;
        Ok(())
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Subscriber {
    query: Query,
    tx: watch::Sender<Snapshot>,
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Collection>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    next_subscription: SubscriptionId,
    offline: bool,
}

impl Inner {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    fn document(&self, path: &str) -> Result<Option<&Value>, StoreError> {
        let (collection, id) = paths::split_document(path)?;
        Ok(self.collections.get(collection).and_then(|c| c.get(id)))
    }

    fn evaluate(&self, query: &Query) -> Snapshot {
        let Some(collection) = self.collections.get(&query.collection) else {
            return Snapshot::default();
        };
        let mut docs: Vec<Document> = collection
            .iter()
            .filter(|(_, data)| {
                query.order_by.as_ref().is_none_or(|o| data.get(&o.field).is_some())
            })
            .map(|(id, data)| Document {
                id: id.clone(),
                path: format!("{}/{id}", query.collection),
                data: data.clone(),
            })
            .collect();
        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                let ord = match order.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                ord.then_with(|| a.id.cmp(&b.id))
            });
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Snapshot { docs }
    }

    /// Publish fresh results to every live query on `collection` and drop
    /// subscribers whose receivers are gone.
    fn publish(&mut self, collection: &str) {
        self.subscribers.retain(|_, s| !s.tx.is_closed());
        let targets: Vec<SubscriptionId> = self
            .subscribers
            .iter()
            .filter(|(_, s)| s.query.collection == collection)
            .map(|(id, _)| *id)
            .collect();
        for id in targets {
            let Some(subscriber) = self.subscribers.get(&id) else { continue };
            let snapshot = self.evaluate(&subscriber.query);
            subscriber.tx.send_replace(snapshot);
        }
    }

    fn write(&mut self, path: &str, data: Data, merge: bool) -> Result<Value, StoreError> {
        let (collection, id) = paths::split_document(path)?;
        let docs = self.collections.entry(collection.to_string()).or_default();
        let next = match docs.remove(id) {
            Some(mut existing) if merge => {
                merge_into(&mut existing, Value::Object(data));
                existing
            }
            _ => Value::Object(data),
        };
        docs.insert(id.to_string(), next.clone());
        self.publish(collection);
        Ok(next)
    }
}

/// Order numbers numerically, strings and bools naturally; mixed types by
/// type rank.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Recursive merge: objects merge key by key, anything else replaces.
fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_into(existing, value);
                    }
                    _ => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// In-memory `DocumentStore`. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_data_file(file: DataFile) -> Self {
        let docs: usize = file.collections.values().map(BTreeMap::len).sum();
        info!(collections = file.collections.len(), docs, "loaded data file");
        let store = Self::new();
        store.lock().collections = file.collections;
        store
    }

    /// Snapshot of every collection.
    #[must_use]
    pub fn export(&self) -> DataFile {
        DataFile { collections: self.lock().collections.clone() }
    }

    /// Fail every subsequent call with `Unavailable` until turned back on.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Live subscriptions whose receivers still exist.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|_, s| !s.tx.is_closed());
        inner.subscribers.len()
    }

    /// Synchronous read, for tests and the CLI.
    #[must_use]
    pub fn peek(&self, path: &str) -> Option<Value> {
        self.lock().document(path).ok().flatten().cloned()
    }

    /// Write a document without going through the async API. Publishes to
    /// subscribers like any other write.
    ///
    /// # Errors
    ///
    /// `InvalidPath` when `path` is not a document path.
    pub fn seed(&self, path: &str, data: Value) -> Result<(), StoreError> {
        let Value::Object(data) = data else {
            return Err(StoreError::InvalidPath(format!("{path}: payload is not an object")));
        };
        self.lock().write(path, data, false).map(|_| ())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, data: Data) -> Result<String, StoreError> {
        paths::check_collection(collection)?;
        let mut inner = self.lock();
        inner.check_online()?;
        let id = Uuid::new_v4().simple().to_string();
        inner.write(&format!("{collection}/{id}"), data, false)?;
        debug!(%collection, %id, "document added");
        Ok(id)
    }

    async fn set(&self, path: &str, data: Data, merge: bool) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;
        inner.write(path, data, merge)?;
        debug!(%path, merge, "document set");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock();
        inner.check_online()?;
        Ok(inner.document(path)?.cloned())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = paths::split_document(path)?;
        let mut inner = self.lock();
        inner.check_online()?;
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some();
        if removed {
            inner.publish(collection);
        }
        debug!(%path, removed, "document deleted");
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        paths::check_collection(collection)?;
        let inner = self.lock();
        inner.check_online()?;
        Ok(inner.collections.get(collection).map_or(0, |c| c.len() as u64))
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        paths::check_collection(&query.collection)?;
        let mut inner = self.lock();
        inner.check_online()?;
        inner.next_subscription += 1;
        let id = inner.next_subscription;
        let (tx, snapshots) = watch::channel(inner.evaluate(&query));
        debug!(id, collection = %query.collection, limit = ?query.limit, "subscribed");
        inner.subscribers.insert(id, Subscriber { query, tx });
        Ok(Subscription { id, snapshots })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.lock().subscribers.remove(&id).is_some() {
            debug!(id, "unsubscribed");
        }
    }

    async fn transact(&self, path: &str, body: TxBody<'_>) -> Result<Option<Value>, StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;
        let decision = body(inner.document(path)?);
        match decision {
            TxDecision::Write(patch) => inner.write(path, patch, true).map(Some),
            TxDecision::Abort => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
