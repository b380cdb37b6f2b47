use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{MatchId, MatchState, MatchStore, MatchUpdate, StoreError};

/// Process-local store. Every update runs under one lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    matches: Mutex<BTreeMap<MatchId, MatchState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<MatchId, MatchState>>, StoreError> {
        self.matches
            .lock()
            .map_err(|_| StoreError::Unavailable("match table lock poisoned".to_string()))
    }
}

impl MatchStore for InMemoryStore {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        self.lock()?.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        let mut matches = self.lock()?;
        let current = matches.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *current = update.apply_to(current);
        Ok(current.clone())
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        let mut matches = self.lock()?;
        if matches.contains_key(&state.match_id) {
            return Err(StoreError::AlreadyExists(state.match_id));
        }
        matches.insert(state.match_id, state.clone());
        Ok(state)
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
