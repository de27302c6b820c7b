//! Shared state store. Readers take snapshots; writers dispatch actions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tracing::debug;

use super::app::{Action, AppState, reduce};
use crate::subscriptions::Generation;

#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<AppState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        let (revision, _) = watch::channel(0);
        Self { state: Arc::new(RwLock::new(initial)), revision: Arc::new(revision) }
    }

    pub async fn dispatch(&self, action: Action) {
        let mut state = self.state.write().await;
        apply(&mut state, action);
        self.revision.send_modify(|r| *r += 1);
    }

    /// Dispatch only if `generation` is still current. Returns whether the
    /// action was applied.
    pub async fn dispatch_current(&self, generation: &Generation, action: Action) -> bool {
        let mut state = self.state.write().await;
        if !generation.is_current() {
            debug!("dropping update from superseded subscription");
            return false;
        }
        apply(&mut state, action);
        self.revision.send_modify(|r| *r += 1);
        true
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&*self.state.read().await)
    }

    /// Number of applied actions.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Wait until `predicate` holds, re-checking after every dispatch.
    /// Returns false on timeout.
    pub async fn wait_until(&self, predicate: impl Fn(&AppState) -> bool, timeout: Duration) -> bool {
        let mut changes = self.revision.subscribe();
        let wait = async {
            loop {
                if predicate(&*self.state.read().await) {
                    return;
                }
                if changes.changed().await.is_err() {
                    return;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

fn apply(slot: &mut AppState, action: Action) {
    let previous = std::mem::take(slot);
    *slot = reduce(previous, action);
}
