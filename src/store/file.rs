use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{MatchId, MatchState, MatchStore, MatchUpdate, StoreError};
use crate::utils::file_utils;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    matches: Vec<MatchState>,
}

impl StoreDocument {
    fn find_mut(&mut self, id: MatchId) -> Option<&mut MatchState> {
        self.matches.iter_mut().find(|m| m.match_id == id)
    }
}

/// Matches kept in one JSON document on disk, shared by every terminal that
/// points at the same path.
///
/// Every read-modify-write holds an exclusive OS lock on `<path>.lock`, so
/// updates from any handle in any process never interleave. Reads hold the
/// same lock shared. Each write replaces the document atomically.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Released when the returned file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File, StoreError> {
        let file = file_utils::open_lock_file(&self.path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        let _lock = self.lock(false)?;
        self.read_document()
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        match file_utils::read_optional(&self.path)? {
            Some(content) if !content.trim().is_empty() => Ok(serde_json::from_str(&content)?),
            _ => Ok(StoreDocument::default()),
        }
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        file_utils::write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    fn with_document<T>(
        &self,
        edit: impl FnOnce(&mut StoreDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = self.lock(true)?;
        let mut doc = self.read_document()?;
        let out = edit(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }
}

impl MatchStore for JsonFileStore {
    fn fetch(&self, id: MatchId) -> Result<MatchState, StoreError> {
        self.load()?
            .matches
            .into_iter()
            .find(|m| m.match_id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: MatchId, update: &MatchUpdate) -> Result<MatchState, StoreError> {
        self.with_document(|doc| {
            let current = doc.find_mut(id).ok_or(StoreError::NotFound(id))?;
            *current = update.apply_to(current);
            Ok(current.clone())
        })
    }

    fn create(&self, state: MatchState) -> Result<MatchState, StoreError> {
        self.with_document(|doc| {
            if doc.find_mut(state.match_id).is_some() {
                return Err(StoreError::AlreadyExists(state.match_id));
            }
            doc.matches.push(state.clone());
            doc.matches.sort_by_key(|m| m.match_id);
            Ok(state)
        })
    }

    fn list(&self) -> Result<Vec<MatchState>, StoreError> {
        let mut matches = self.load()?.matches;
        matches.sort_by_key(|m| m.match_id);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("matches.json"));

        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.fetch(MatchId(1)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn updates_are_visible_to_a_second_handle_on_the_same_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let writer = JsonFileStore::open(&path);
        let reader = JsonFileStore::open(&path);
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        writer.create(MatchState::new(MatchId(4), 1800, t0)).unwrap();
        let t1 = t0 + chrono::Duration::seconds(40);
        writer.update(MatchId(4), &MatchUpdate::pause(1760, t1)).unwrap();

        let seen = reader.fetch(MatchId(4)).unwrap();
        assert_eq!(seen.elapsed_seconds, 1760);
        assert!(seen.is_paused);
        assert_eq!(seen.last_action_at, Some(t1));
    }

    #[test]
    fn concurrent_handles_never_lose_each_others_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let setup = JsonFileStore::open(&path);
        setup.create(MatchState::new(MatchId(1), 1800, t0)).unwrap();
        setup.create(MatchState::new(MatchId(2), 1800, t0)).unwrap();

        let errors: Vec<usize> = std::thread::scope(|scope| {
            let workers: Vec<_> = [MatchId(1), MatchId(2)]
                .into_iter()
                .map(|id| {
                    let store = JsonFileStore::open(&path);
                    scope.spawn(move || {
                        (1..=200u32)
                            .filter(|&i| {
                                let at = t0 + chrono::Duration::seconds(i64::from(i));
                                store.update(id, &MatchUpdate::pause(1800 - i, at)).is_err()
                            })
                            .count()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(errors, vec![0, 0]);
        let reader = JsonFileStore::open(&path);
        for id in [MatchId(1), MatchId(2)] {
            let state = reader.fetch(id).unwrap();
            assert_eq!(state.elapsed_seconds, 1600, "match {}", id);
            assert_eq!(state.last_action_at, Some(t0 + chrono::Duration::seconds(200)));
        }
    }

    #[test]
    fn document_is_camel_case_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let store = JsonFileStore::open(&path);
        store
            .create(MatchState::new(MatchId(1), 1800, Utc::now()))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"elapsedSeconds\": 1800"));
        assert!(raw.contains("\"isPaused\": true"));
    }

    #[test]
    fn corrupt_document_surfaces_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path).fetch(MatchId(1)).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(!err.is_recoverable());
    }
}
