//! Match state persistence.
//!
//! The clock engine only sees the [`MatchStore`] contract: fetch a match, or
//! apply a partial update atomically and get the full resulting state back.

pub mod error;
pub mod file;
pub mod memory;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use state::{MatchId, MatchState, MatchUpdate};

use std::sync::Arc;

pub trait MatchStore {
    /// Current persisted state of `id`.
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError>;

    /// Apply `update` atomically and return the resulting state.
    ///
    /// Concurrent updates to the same match never interleave; the last one
    /// applied wins.
    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError>;

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError>;

    /// Every stored match, ordered by id.
    fn list(&self) -> Result<Vec<MatchState>, StoreError>;
}

impl<T: MatchStore + ?Sized> MatchStore for &T {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        (**self).fetch(id)
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        (**self).update(id, update)
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        (**self).create(state)
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        (**self).list()
    }
}

impl<T: MatchStore + ?Sized> MatchStore for Arc<T> {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        (**self).fetch(id)
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        (**self).update(id, update)
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        (**self).create(state)
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        (**self).list()
    }
}

impl<T: MatchStore + ?Sized> MatchStore for Box<T> {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        (**self).fetch(id)
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        (**self).update(id, update)
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        (**self).create(state)
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        (**self).list()
    }
}
