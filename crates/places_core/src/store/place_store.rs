//! Place store implementation.
//!
//! # Responsibility
//! - Load the collection from one storage key and rewrite it on every change.
//! - Expose read snapshots and subscribe/notify to UI surfaces.
//!
//! # Invariants
//! - `writer` is held across read-modify-write-commit-notify, so no
//!   mutation is ever computed from stale state.
//! - `state` only changes after storage accepted the new collection.
//! - Listeners run while `writer` is held; they may read the store but must
//!   not call loads or mutations synchronously.

use super::codec::{decode_places, encode_places, PLACES_STORAGE_KEY};
use super::{StoreError, StoreResult};
use crate::model::place::{Place, PlacePatch};
use crate::storage::KeyValueStorage;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Instant;

type Listener = Arc<dyn Fn(&[Place]) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
struct StoreState {
    places: Vec<Place>,
    loading: bool,
    // Set once durable state has actually been read; a failed read leaves it.
    loaded: bool,
    load_failed: bool,
    // Last read attempt hit a storage error; nothing durable is known yet.
    read_failed: bool,
    revision: u64,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

/// Authoritative saved-place collection backed by key-value storage.
pub struct PlaceStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    writer: Mutex<()>,
    state: RwLock<StoreState>,
    listeners: Mutex<Listeners>,
}

impl<S: KeyValueStorage> PlaceStore<S> {
    /// Creates an unloaded store over `storage`.
    ///
    /// `is_loading()` stays `true` until the first `load` finishes. Mutations
    /// issued before durable state was read load it first, so they never
    /// overwrite stored places with an empty collection.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, PLACES_STORAGE_KEY)
    }

    /// Creates an unloaded store persisting under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            writer: Mutex::new(()),
            state: RwLock::new(StoreState {
                places: Vec::new(),
                loading: true,
                loaded: false,
                load_failed: false,
                read_failed: false,
                revision: 0,
            }),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    /// Reads the durable record into memory.
    ///
    /// A missing record yields an empty collection. A malformed record
    /// empties the in-memory collection, leaves the durable bytes untouched
    /// and returns `StoreError::Malformed`; until it is resolved, `add`,
    /// `remove` and `update` fail with `UnresolvedLoadFailure`.
    pub fn load(&self) -> StoreResult<()> {
        let _writer = self.lock_writer();
        self.load_locked()
    }

    /// Re-reads durable state, replacing the in-memory collection.
    pub fn reload(&self) -> StoreResult<()> {
        self.load()
    }

    /// Prepends `place` and persists the collection.
    ///
    /// No field validation happens here. Duplicate ids are rejected.
    pub fn add(&self, place: Place) -> StoreResult<()> {
        self.mutate("add", |places| {
            if places.iter().any(|existing| existing.id == place.id) {
                return Err(StoreError::DuplicateId(place.id));
            }
            places.insert(0, place);
            Ok(())
        })
    }

    /// Removes the place with `id`. A missing id is a no-op.
    pub fn remove(&self, id: &str) -> StoreResult<()> {
        self.mutate("remove", |places| {
            let before = places.len();
            places.retain(|place| place.id != id);
            if places.len() == before {
                debug!("event=place_remove module=store status=noop reason=not_found");
            }
            Ok(())
        })
    }

    /// Merges `patch` into the place with `id`. A missing id is a no-op.
    pub fn update(&self, id: &str, patch: &PlacePatch) -> StoreResult<()> {
        self.mutate("update", |places| {
            match places.iter_mut().find(|place| place.id == id) {
                Some(place) => place.apply(patch),
                None => debug!("event=place_update module=store status=noop reason=not_found"),
            }
            Ok(())
        })
    }

    /// Persists an empty collection.
    ///
    /// Also resolves a pending malformed-load state by discarding the
    /// unreadable record.
    pub fn clear_all(&self) -> StoreResult<()> {
        let _writer = self.lock_writer();
        self.persist_locked("clear_all", Vec::new(), Instant::now())
    }

    /// Returns a snapshot of the current collection, newest first.
    pub fn places(&self) -> Vec<Place> {
        self.read_state().places.clone()
    }

    /// Returns one place by id.
    pub fn get(&self, id: &str) -> Option<Place> {
        self.read_state()
            .places
            .iter()
            .find(|place| place.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read_state().places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().places.is_empty()
    }

    /// `true` until the first load attempt completes, success or failure.
    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    /// `true` while a malformed record is awaiting `reload` or `clear_all`.
    pub fn has_unresolved_load_failure(&self) -> bool {
        self.read_state().load_failed
    }

    /// `true` while the last load could not read storage at all.
    ///
    /// The in-memory collection is then not known to match durable state.
    /// Cleared by any later successful load or write.
    pub fn has_unresolved_read_failure(&self) -> bool {
        self.read_state().read_failed
    }

    /// Monotonic counter bumped on every committed change.
    pub fn revision(&self) -> u64 {
        self.read_state().revision
    }

    /// Registers a listener called with the collection after each change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[Place]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.insert(id, Arc::new(listener));
        SubscriptionId(id)
    }

    /// Removes a listener. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(&id.0)
            .is_some()
    }

    fn mutate(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Vec<Place>) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let _writer = self.lock_writer();

        let (loaded, load_failed) = {
            let state = self.read_state();
            (state.loaded, state.load_failed)
        };
        if !loaded {
            self.load_locked()?;
        } else if load_failed {
            return Err(StoreError::UnresolvedLoadFailure);
        }

        let mut next = self.read_state().places.clone();
        f(&mut next)?;
        self.persist_locked(op, next, started_at)
    }

    fn persist_locked(
        &self,
        op: &'static str,
        next: Vec<Place>,
        started_at: Instant,
    ) -> StoreResult<()> {
        let bytes = encode_places(&next).map_err(StoreError::Encode)?;

        if let Err(err) = self.storage.set(&self.key, &bytes) {
            error!(
                "event=places_persist module=store status=error op={} duration_ms={} error_code=storage_write_failed error={}",
                op,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=places_persist module=store status=ok op={} count={} bytes={} duration_ms={}",
            op,
            next.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        self.commit(next, false);
        Ok(())
    }

    fn load_locked(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        debug!("event=places_load module=store status=start");

        let raw = match self.storage.get(&self.key) {
            Ok(raw) => raw,
            Err(err) => {
                {
                    let mut state = self.write_state();
                    state.loading = false;
                    state.read_failed = true;
                }
                error!(
                    "event=places_load module=store status=error duration_ms={} error_code=storage_read_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        let Some(raw) = raw else {
            info!(
                "event=places_load module=store status=ok source=absent count=0 duration_ms={}",
                started_at.elapsed().as_millis()
            );
            self.commit(Vec::new(), false);
            return Ok(());
        };

        match decode_places(&raw) {
            Ok(places) => {
                info!(
                    "event=places_load module=store status=ok source=storage count={} duration_ms={}",
                    places.len(),
                    started_at.elapsed().as_millis()
                );
                self.commit(places, false);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=places_load module=store status=error bytes={} duration_ms={} error_code=malformed_record error={}",
                    raw.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                self.commit(Vec::new(), true);
                Err(StoreError::Malformed(err))
            }
        }
    }

    fn commit(&self, places: Vec<Place>, load_failed: bool) {
        let snapshot = {
            let mut state = self.write_state();
            state.places = places;
            state.loading = false;
            state.loaded = true;
            state.load_failed = load_failed;
            state.read_failed = false;
            state.revision += 1;
            state.places.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, places: &[Place]) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(places);
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
