//! Live query slots: at most one subscription per concern.
//!
//! DESIGN
//! ======
//! A `LiveQuery<K>` owns one subscription and the task pumping its
//! snapshots into the state store. `ensure(key, ..)` is a no-op while the key
//! is unchanged; a new key first cancels the old subscription and then opens
//! the new one.
//!
//! Cancelling is synchronous: the store unsubscribes, the pump task is
//! aborted, and the slot's generation counter moves on. Each pump carries the
//! generation it was started under and the state store drops any update whose
//! generation is no longer current, checked under the state write lock. A
//! snapshot from a superseded query can therefore never land after its
//! replacement's.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::backend::{DocumentStore, Query, Snapshot, StoreError, SubscriptionId};

/// Token identifying one subscription lifetime of a slot.
#[derive(Debug, Clone)]
pub struct Generation {
    counter: Arc<AtomicU64>,
    value: u64,
}

impl Generation {
    /// A generation that is always current, for one-off dispatches.
    #[must_use]
    pub fn detached() -> Self {
        Self { counter: Arc::new(AtomicU64::new(0)), value: 0 }
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.value
    }
}

struct Active<K> {
    key: K,
    subscription: SubscriptionId,
    pump: JoinHandle<()>,
}

pub struct LiveQuery<K> {
    name: &'static str,
    generation: Arc<AtomicU64>,
    active: Option<Active<K>>,
}

impl<K: Clone + PartialEq + Debug> LiveQuery<K> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, generation: Arc::new(AtomicU64::new(0)), active: None }
    }

    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.active.as_ref().map(|a| &a.key)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Subscribe to `query` under `key` unless `key` is already active.
    /// Returns whether a new subscription was opened.
    ///
    /// `on_snapshot` runs for the initial result and every change after it.
    ///
    /// # Errors
    ///
    /// Returns the store error when subscribing fails; the slot is then
    /// left empty.
    pub async fn ensure<F, Fut>(
        &mut self,
        key: K,
        store: &Arc<dyn DocumentStore>,
        query: Query,
        on_snapshot: F,
    ) -> Result<bool, StoreError>
    where
        F: Fn(Snapshot, Generation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.key() == Some(&key) {
            return Ok(false);
        }
        self.clear(store.as_ref());

        let subscription = store.subscribe(query).await?;
        let generation = Generation {
            counter: Arc::clone(&self.generation),
            value: self.generation.load(Ordering::SeqCst),
        };
        let mut snapshots = subscription.snapshots;
        let name = self.name;
        let pump = tokio::spawn(async move {
            loop {
                let snapshot = snapshots.borrow_and_update().clone();
                on_snapshot(snapshot, generation.clone()).await;
                if snapshots.changed().await.is_err() {
                    debug!(query = name, "subscription closed");
                    break;
                }
            }
        });
        debug!(query = self.name, ?key, id = subscription.id, "live query opened");
        self.active = Some(Active { key, subscription: subscription.id, pump });
        Ok(true)
    }

    /// Tear down the active subscription, if any.
    pub fn clear(&mut self, store: &dyn DocumentStore) {
        let Some(active) = self.active.take() else { return };
        self.generation.fetch_add(1, Ordering::SeqCst);
        store.unsubscribe(active.subscription);
        active.pump.abort();
        debug!(query = self.name, key = ?active.key, "live query cancelled");
    }
}

#[cfg(test)]
#[path = "subscriptions_test.rs"]
mod tests;
