use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{InMemoryStore, MatchId, MatchState, MatchStore, MatchUpdate, StoreError};

/// In-memory store that records every update and can be told to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_updates: AtomicBool,
    fail_fetches: AtomicBool,
    fetches: AtomicUsize,
    updates: Mutex<Vec<MatchUpdate>>,
}

impl FlakyStore {
    pub fn with_match(state: MatchState) -> Self {
        let store = Self::default();
        store.inner.create(state).unwrap();
        store
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Updates that reached the store, successful or not.
    pub fn updates(&self) -> Vec<MatchUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Write straight to the backing table, as another client would.
    pub fn external_update(&self, id: MatchId, update: &MatchUpdate) -> MatchState {
        self.inner.update(id, update).unwrap()
    }
}

impl MatchStore for FlakyStore {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("fetch refused".to_string()));
        }
        self.inner.fetch(id)
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        self.updates.lock().unwrap().push(update.clone());
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("update refused".to_string()));
        }
        self.inner.update(id, update)
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        self.inner.create(state)
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        self.inner.list()
    }
}
