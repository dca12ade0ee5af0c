// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A keyed, reference-counted cache of decoded assets with at-most-one
//! in-flight load per key.

use quark_core::asset::{Asset, AssetError, AssetHandle, AssetKey};
use std::{
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
};

/// A continuation waiting for the outcome of a load.
pub type Waiter = Box<dyn FnOnce(Result<AssetHandle, AssetError>) + Send>;

/// The lifecycle state of a cache entry.
///
/// `Failed` is only ever reported as the outcome of
/// [`complete`](AssetCache::complete): failed entries are removed at once and
/// a later load starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A load is in flight; waiters are queued.
    Pending,
    /// The asset is decoded and published.
    Ready,
    /// The load failed and the entry was removed.
    Failed,
}

/// Identifies the load attempt that owns a pending entry.
///
/// A completion carrying a stale ticket (its entry was cancelled and maybe
/// re-requested since) is discarded instead of overwriting the new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// The result of [`AssetCache::acquire`] and [`AssetCache::join`].
pub enum Acquire {
    /// The asset is ready; its refcount was incremented. The waiter is handed
    /// back so the caller decides on which thread to notify it.
    Ready(AssetHandle, Waiter),
    /// A load is already in flight; the waiter was queued.
    Waiting,
    /// No entry existed; one was created in the pending state with the waiter
    /// queued first. The caller must perform the load and call
    /// [`complete`](AssetCache::complete) with this ticket.
    Load(LoadTicket),
    /// No entry exists and none was created (only returned by `join`).
    Absent(Waiter),
}

impl fmt::Debug for Acquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acquire::Ready(handle, _) => f.debug_tuple("Ready").field(handle).finish(),
            Acquire::Waiting => f.write_str("Waiting"),
            Acquire::Load(ticket) => f.debug_tuple("Load").field(ticket).finish(),
            Acquire::Absent(_) => f.write_str("Absent"),
        }
    }
}

/// Completes a pending entry with [`AssetError::Abandoned`] if it is dropped
/// before [`complete`](LoadGuard::complete) is called.
///
/// The loader moves the guard into whatever runs the load. A panic in a
/// locator or decoder, or a locator that drops its callback, then still
/// settles the entry and wakes its waiters.
pub struct LoadGuard {
    cache: Arc<AssetCache>,
    key: AssetKey,
    ticket: Option<LoadTicket>,
}

impl LoadGuard {
    /// Arms a guard for the load identified by `ticket`.
    pub fn new(cache: Arc<AssetCache>, key: AssetKey, ticket: LoadTicket) -> Self {
        Self {
            cache,
            key,
            ticket: Some(ticket),
        }
    }

    /// The entry being loaded.
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Publishes the outcome and disarms the guard.
    pub fn complete(mut self, result: Result<Arc<dyn Asset>, AssetError>) -> Option<LoadState> {
        let ticket = self.ticket.take()?;
        self.cache.complete(&self.key, ticket, result)
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        if thread::panicking() {
            log::error!("Load of '{}' panicked; failing its waiters.", self.key);
        } else {
            log::warn!("Load of '{}' ended without a result.", self.key);
        }
        self.cache.complete(
            &self.key,
            ticket,
            Err(AssetError::Abandoned {
                key: self.key.clone(),
            }),
        );
    }
}

impl fmt::Debug for LoadGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadGuard")
            .field("key", &self.key)
            .field("ticket", &self.ticket)
            .finish()
    }
}

// A panicking waiter must not keep the ones queued behind it from running.
fn notify(key: &AssetKey, waiter: Waiter, outcome: Result<AssetHandle, AssetError>) {
    if panic::catch_unwind(AssertUnwindSafe(move || waiter(outcome))).is_err() {
        log::error!("A waiter for '{key}' panicked.");
    }
}

enum Slot {
    Pending(Vec<Waiter>),
    Ready { handle: AssetHandle, refs: usize },
}

struct Entry {
    generation: u64,
    slot: Slot,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<AssetKey, Entry>,
    next_generation: u64,
}

/// A central, in-memory cache mapping asset keys to decoded resources.
///
/// The single mutex around the entry map is the pipeline's only mutual
/// exclusion boundary: the check-and-create in [`acquire`](Self::acquire)
/// happens under it, which is what guarantees that two threads can never both
/// become the loader of the same key. Waiters are always invoked after the
/// lock has been dropped.
///
/// Entries are retained at refcount zero until explicitly unloaded.
#[derive(Default)]
pub struct AssetCache {
    inner: Mutex<Inner>,
}

impl AssetCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `key`, creating a pending entry if there is none.
    pub fn acquire(&self, key: &AssetKey, waiter: Waiter) -> Acquire {
        self.acquire_inner(key, waiter, true)
    }

    /// Like [`acquire`](Self::acquire), but never creates an entry.
    pub fn join(&self, key: &AssetKey, waiter: Waiter) -> Acquire {
        self.acquire_inner(key, waiter, false)
    }

    fn acquire_inner(&self, key: &AssetKey, waiter: Waiter, create: bool) -> Acquire {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.entries.get_mut(key) {
            Some(Entry {
                slot: Slot::Ready { handle, refs },
                ..
            }) => {
                *refs += 1;
                log::trace!("Cache hit for '{key}' (refs={refs}).");
                Acquire::Ready(handle.clone(), waiter)
            }
            Some(Entry {
                slot: Slot::Pending(waiters),
                ..
            }) => {
                waiters.push(waiter);
                log::trace!("Joined in-flight load of '{key}' ({} waiters).", waiters.len());
                Acquire::Waiting
            }
            None if !create => Acquire::Absent(waiter),
            None => {
                let generation = inner.next_generation;
                inner.next_generation += 1;
                inner.entries.insert(
                    key.clone(),
                    Entry {
                        generation,
                        slot: Slot::Pending(vec![waiter]),
                    },
                );
                log::trace!("Created pending entry for '{key}'.");
                Acquire::Load(LoadTicket { generation })
            }
        }
    }

    /// Publishes the outcome of the load identified by `ticket`.
    ///
    /// On success the entry becomes ready with one reference per queued
    /// waiter; on failure it is removed. Every waiter is then invoked, in the
    /// order it was registered, with the same outcome.
    ///
    /// Returns `None` when the ticket no longer owns the entry (the load was
    /// cancelled); a successful result is then dropped after its host memory
    /// is released.
    pub fn complete(
        &self,
        key: &AssetKey,
        ticket: LoadTicket,
        result: Result<Arc<dyn Asset>, AssetError>,
    ) -> Option<LoadState> {
        let mut guard = self.lock();
        let waiters = match guard.entries.remove(key) {
            Some(Entry {
                generation,
                slot: Slot::Pending(waiters),
            }) if generation == ticket.generation => waiters,
            other => {
                if let Some(entry) = other {
                    guard.entries.insert(key.clone(), entry);
                }
                drop(guard);
                log::debug!("Discarding stale completion for '{key}'.");
                if let Ok(asset) = result {
                    asset.release_host_memory();
                }
                return None;
            }
        };

        let (outcome, state) = match result {
            Ok(asset) => {
                let handle = AssetHandle::new(key.clone(), asset);
                guard.entries.insert(
                    key.clone(),
                    Entry {
                        generation: ticket.generation,
                        slot: Slot::Ready {
                            handle: handle.clone(),
                            refs: waiters.len(),
                        },
                    },
                );
                (Ok(handle), LoadState::Ready)
            }
            Err(e) => (Err(e), LoadState::Failed),
        };
        drop(guard);

        log::debug!(
            "Load of '{key}' finished as {state:?}; notifying {} waiters.",
            waiters.len()
        );
        for waiter in waiters {
            notify(key, waiter, outcome.clone());
        }
        Some(state)
    }

    /// Drops one reference to a ready entry.
    ///
    /// Returns `false` if the entry is not ready or already at zero; the count
    /// never goes negative. The entry stays cached at zero.
    pub fn release(&self, key: &AssetKey) -> bool {
        match self.lock().entries.get_mut(key) {
            Some(Entry {
                slot: Slot::Ready { refs, .. },
                ..
            }) if *refs > 0 => {
                *refs -= 1;
                true
            }
            _ => false,
        }
    }

    /// Evicts a ready entry regardless of its refcount and frees its host memory.
    ///
    /// The handle is returned so the device owner can delete the device-side
    /// state. Pending entries are left alone.
    pub fn unload(&self, key: &AssetKey) -> Option<AssetHandle> {
        let mut guard = self.lock();
        let refs = match guard.entries.get(key) {
            Some(Entry {
                slot: Slot::Ready { refs, .. },
                ..
            }) => *refs,
            _ => return None,
        };
        let entry = guard.entries.remove(key)?;
        drop(guard);

        if refs > 0 {
            log::warn!("Unloading '{key}' while it still has {refs} references.");
        }
        match entry.slot {
            Slot::Ready { handle, .. } => {
                handle.release_host_memory();
                Some(handle)
            }
            Slot::Pending(_) => None,
        }
    }

    /// Drains the whole cache.
    ///
    /// Pending loads are cancelled: their waiters receive
    /// [`AssetError::Cancelled`] and their eventual completion is discarded.
    /// Ready entries have their host memory released and are returned for
    /// device-side deletion. Calling it on an empty cache does nothing.
    pub fn unload_all(&self) -> Vec<AssetHandle> {
        let drained: Vec<(AssetKey, Entry)> = self.lock().entries.drain().collect();
        if drained.is_empty() {
            return Vec::new();
        }

        let mut evicted = Vec::new();
        let mut cancelled = 0;
        for (key, entry) in drained {
            match entry.slot {
                Slot::Pending(waiters) => {
                    cancelled += 1;
                    for waiter in waiters {
                        notify(&key, waiter, Err(AssetError::Cancelled { key: key.clone() }));
                    }
                }
                Slot::Ready { handle, .. } => {
                    handle.release_host_memory();
                    evicted.push(handle);
                }
            }
        }
        log::info!(
            "Unloaded {} assets and cancelled {cancelled} pending loads.",
            evicted.len()
        );
        evicted
    }

    /// The state of the entry for `key`, if any.
    pub fn state(&self, key: &AssetKey) -> Option<LoadState> {
        self.lock().entries.get(key).map(|entry| match entry.slot {
            Slot::Pending(_) => LoadState::Pending,
            Slot::Ready { .. } => LoadState::Ready,
        })
    }

    /// The refcount of a ready entry.
    pub fn ref_count(&self, key: &AssetKey) -> Option<usize> {
        match self.lock().entries.get(key) {
            Some(Entry {
                slot: Slot::Ready { refs, .. },
                ..
            }) => Some(*refs),
            _ => None,
        }
    }

    /// Whether an entry (pending or ready) exists for `key`.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Number of entries, pending ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("entries", &self.len())
            .finish()
    }
}
