// Copyright 2025 the Tracescope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deduplicating asynchronous chunk cache.
//!
//! [`FetchCache::get`] never blocks. A miss schedules exactly one fetch for the key on the
//! cache's spawner and keeps answering `None` until that fetch settles. Resolved chunks are
//! retained for the lifetime of the cache; entries are inserted once and never replaced.
//!
//! Consumers learn about resolutions either by polling again on their next pass, through a
//! cache-wide observer ([`FetchCache::set_observer`]), or through a one-shot per-key callback
//! ([`FetchCache::when_ready`]).

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::task::{Spawn, SpawnExt};
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, error, warn};

use crate::chunk::{Chunk, ChunkGeometry, ChunkKey, ChunkRows};
use crate::store::{ChunkStore, StoreError};

type Waiter = Box<dyn FnOnce(&Arc<Chunk>) + Send>;
type Observer = Arc<dyn Fn(ChunkKey) + Send + Sync>;

/// Observable lifecycle state of a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    /// Never requested.
    Absent,
    /// A fetch is in flight.
    Pending,
    /// Resolved; the chunk is cached permanently.
    Resolved,
    /// The last fetch failed.
    Failed {
        /// Fetches attempted so far.
        attempts: u32,
        /// Whether a later lookup will fetch again.
        retryable: bool,
    },
}

enum Entry {
    Pending {
        attempt: u32,
        waiters: SmallVec<[Waiter; 1]>,
    },
    Resolved(Arc<Chunk>),
    Failed {
        attempts: u32,
        retryable: bool,
    },
}

impl Entry {
    fn status(&self) -> EntryStatus {
        match self {
            Self::Pending { .. } => EntryStatus::Pending,
            Self::Resolved(_) => EntryStatus::Resolved,
            Self::Failed {
                attempts,
                retryable,
            } => EntryStatus::Failed {
                attempts: *attempts,
                retryable: *retryable,
            },
        }
    }
}

struct Shared {
    geometry: ChunkGeometry,
    entries: Mutex<HashMap<ChunkKey, Entry>>,
    observer: Mutex<Option<Observer>>,
}

impl Shared {
    // Entries are insert-once; a poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<ChunkKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> Option<Observer> {
        self.observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn settle(&self, key: ChunkKey, attempt: u32, outcome: Result<ChunkRows, StoreError>) {
        let settled = match outcome {
            Ok(rows) => match Chunk::from_rows(key, rows, &self.geometry) {
                Ok(chunk) => Ok(Arc::new(chunk)),
                Err(err) => {
                    error!(%key, error = %err, "chunk store returned a malformed chunk");
                    debug_assert!(false, "malformed chunk {key}: {err}");
                    Err(false)
                }
            },
            Err(err) => {
                warn!(%key, attempt, error = %err, "chunk fetch failed");
                Err(true)
            }
        };

        let waiters = {
            let mut entries = self.entries();
            let waiters = match entries.remove(&key) {
                Some(Entry::Pending { waiters, .. }) => waiters,
                _ => SmallVec::new(),
            };
            let entry = match &settled {
                Ok(chunk) => Entry::Resolved(Arc::clone(chunk)),
                Err(retryable) => Entry::Failed {
                    attempts: attempt,
                    retryable: *retryable,
                },
            };
            entries.insert(key, entry);
            waiters
        };

        if let Ok(chunk) = settled {
            debug!(%key, buckets = chunk.bucket_count(), "chunk resolved");
            for waiter in waiters {
                waiter(&chunk);
            }
            if let Some(observer) = self.observer() {
                observer(key);
            }
        }
    }
}

/// An insert-once cache of chunks, fetching misses through a [`ChunkStore`].
///
/// At most one fetch per key is ever in flight. Failed fetches are not recorded as resolved:
/// a later lookup of a failed key fetches again, so the retry cadence is the caller's polling
/// cadence. Chunks that violate the row contract are never retried.
pub struct FetchCache<S, Sp> {
    store: Arc<S>,
    spawner: Sp,
    shared: Arc<Shared>,
}

impl<S, Sp> fmt::Debug for FetchCache<S, Sp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCache")
            .field("geometry", &self.shared.geometry)
            .field("entries", &self.shared.entries().len())
            .finish_non_exhaustive()
    }
}

impl<S: ChunkStore, Sp: Spawn> FetchCache<S, Sp> {
    /// Creates an empty cache fetching from `store` and running fetches on `spawner`.
    pub fn new(store: S, spawner: Sp, geometry: ChunkGeometry) -> Self {
        Self {
            store: Arc::new(store),
            spawner,
            shared: Arc::new(Shared {
                geometry,
                entries: Mutex::new(HashMap::new()),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Registers a callback invoked once per key when its chunk resolves.
    ///
    /// The callback runs on whichever executor completed the fetch. Hosts typically use it to
    /// request a redraw.
    pub fn set_observer(&self, observer: impl Fn(ChunkKey) + Send + Sync + 'static) {
        *self
            .shared
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(observer));
    }

    /// Chunk geometry used to validate incoming rows.
    pub fn geometry(&self) -> &ChunkGeometry {
        &self.shared.geometry
    }

    /// Returns the cached chunk for `key`, scheduling a fetch on a miss.
    pub fn get(&self, key: ChunkKey) -> Option<Arc<Chunk>> {
        self.request(key, None)
    }

    /// Runs `f` once the chunk for `key` is available.
    ///
    /// `f` runs immediately when the chunk is already cached; otherwise it is queued behind the
    /// in-flight fetch (starting one if needed). Queued callbacks are dropped if that fetch
    /// fails.
    pub fn when_ready(&self, key: ChunkKey, f: impl FnOnce(&Arc<Chunk>) + Send + 'static) {
        self.request(key, Some(Box::new(f)));
    }

    /// Lifecycle state of `key`. Does not schedule anything.
    pub fn status(&self, key: ChunkKey) -> EntryStatus {
        self.shared
            .entries()
            .get(&key)
            .map_or(EntryStatus::Absent, Entry::status)
    }

    /// Number of resolved chunks.
    pub fn len(&self) -> usize {
        self.shared
            .entries()
            .values()
            .filter(|e| matches!(e, Entry::Resolved(_)))
            .count()
    }

    /// Whether no chunk has resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn request(&self, key: ChunkKey, waiter: Option<Waiter>) -> Option<Arc<Chunk>> {
        let attempt = {
            let mut entries = self.shared.entries();
            let attempt = match entries.get_mut(&key) {
                Some(Entry::Resolved(chunk)) => {
                    let chunk = Arc::clone(chunk);
                    drop(entries);
                    if let Some(waiter) = waiter {
                        waiter(&chunk);
                    }
                    return Some(chunk);
                }
                Some(Entry::Pending { waiters, .. }) => {
                    waiters.extend(waiter);
                    return None;
                }
                Some(Entry::Failed {
                    retryable: false, ..
                }) => return None,
                Some(Entry::Failed { attempts, .. }) => *attempts + 1,
                None => 1,
            };
            entries.insert(
                key,
                Entry::Pending {
                    attempt,
                    waiters: waiter.into_iter().collect(),
                },
            );
            attempt
        };

        self.spawn_fetch(key, attempt);
        None
    }

    fn spawn_fetch(&self, key: ChunkKey, attempt: u32) {
        debug!(%key, attempt, "scheduling chunk fetch");
        let fetch = self.store.fetch(key);
        let shared = Arc::clone(&self.shared);
        let task = async move {
            let outcome = fetch.await;
            shared.settle(key, attempt, outcome);
        };
        if let Err(err) = self.spawner.spawn(task) {
            warn!(%key, error = %err, "executor refused chunk fetch");
            let mut entries = self.shared.entries();
            if matches!(entries.get(&key), Some(Entry::Pending { attempt: a, .. }) if *a == attempt)
            {
                entries.remove(&key);
            }
        }
    }
}
