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

//! The `AssetManager` is responsible for resolving, loading and disposing of
//! resources.

use super::{
    registry::{DecoderRegistry, LocatorRegistry},
    AssetConfig, PendingLoad,
};
use anyhow::{Context, Result};
use quark_core::asset::{
    Asset, AssetDecoder, AssetError, AssetHandle, AssetId, AssetKey, AssetLocator, ByteStream,
    DeviceContext, DeviceDeletionQueue, LocateError, LocateMode,
};
use quark_data::assets::{Acquire, AssetCache, LoadGuard, LoadState, Waiter};
use quark_lanes::asset_lane::{
    decoding::default_decoders,
    locating::{FileSystemLocator, HttpLocator, PackLocator},
};
use std::{sync::Arc, time::Duration};
use tokio::runtime::{Builder, Handle, Runtime};

/// Everything needed to load one identifier, resolved before any I/O.
struct Route {
    key: AssetKey,
    extension: String,
    locator: Arc<dyn AssetLocator>,
    decoder: Arc<dyn AssetDecoder>,
}

fn decode(
    decoder: &dyn AssetDecoder,
    stream: ByteStream,
    extension: &str,
    key: &AssetKey,
) -> Result<Arc<dyn Asset>, AssetError> {
    log::debug!("Decoding '{key}'.");
    decoder
        .decode(stream, extension)
        .map_err(|source| AssetError::DecodeFailed {
            key: key.clone(),
            source,
        })
}

/// The asset manager: routes identifiers to locators and decoders and
/// coordinates every request through a shared cache.
///
/// Registration takes `&mut self`; loading and querying take `&self`, so a
/// configured manager can be shared across threads behind an `Arc`.
///
/// Asynchronous work runs on a tokio runtime owned by the manager: locator
/// requests are issued from its blocking pool, and completion callbacks
/// (including those for cache hits and early failures) are never invoked
/// on the requesting thread.
pub struct AssetManager {
    config: AssetConfig,
    locators: LocatorRegistry,
    decoders: DecoderRegistry,
    cache: Arc<AssetCache>,
    deletions: DeviceDeletionQueue,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl AssetManager {
    /// Creates a manager with no locator or decoder registered.
    pub fn new(config: AssetConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("quark-assets")
            .enable_all()
            .build()
            .context("Failed to build the asset runtime")?;

        Ok(Self {
            config,
            locators: LocatorRegistry::default(),
            decoders: DecoderRegistry::default(),
            cache: Arc::new(AssetCache::new()),
            deletions: DeviceDeletionQueue::new(),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Creates a manager with the built-in locators and decoders registered
    /// as described by `config`.
    pub fn with_defaults(config: AssetConfig) -> Result<Self> {
        let mut manager = Self::new(config)?;
        let config = manager.config.clone();

        manager.register_locator(
            &config.default_scheme,
            Arc::new(FileSystemLocator::new(config.root.clone())),
        );
        if let Some(pack) = &config.pack {
            let locator = PackLocator::open(&pack.index, &pack.data)
                .with_context(|| format!("Failed to mount pack under scheme '{}'", pack.scheme))?;
            manager.register_locator(&pack.scheme, Arc::new(locator));
        }
        if let Some(remote) = &config.remote {
            let locator = HttpLocator::new(
                remote.base_url.clone(),
                Duration::from_millis(remote.timeout_ms),
                manager.handle.clone(),
            )?;
            manager.register_locator(&remote.scheme, Arc::new(locator));
        }
        for (decoder, extensions) in default_decoders(&config.capabilities) {
            manager.register_decoder(decoder, extensions);
        }
        Ok(manager)
    }

    /// The configuration the manager was built with.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Binds `locator` to `scheme`, replacing any previous binding.
    pub fn register_locator(&mut self, scheme: &str, locator: Arc<dyn AssetLocator>) {
        self.locators.register(scheme, locator);
    }

    /// Binds `decoder` to each of `extensions`, replacing previous bindings.
    pub fn register_decoder(&mut self, decoder: Arc<dyn AssetDecoder>, extensions: &[&str]) {
        self.decoders.register(decoder, extensions);
    }

    /// A handle to the manager's runtime, for locators that issue async I/O.
    pub fn runtime_handle(&self) -> &Handle {
        &self.handle
    }

    fn route(&self, id: &str) -> Result<Route, AssetError> {
        let id = AssetId::parse(id)?;
        let key = id.resolve(&self.config.default_scheme);
        let locator = self
            .locators
            .get(key.scheme())
            .ok_or_else(|| AssetError::UnknownScheme(key.scheme().to_string()))?;
        let extension = id.extension().unwrap_or_default().to_string();
        let decoder = self
            .decoders
            .get(&extension)
            .ok_or_else(|| AssetError::UnknownExtension(extension.clone()))?;
        Ok(Route {
            key,
            extension,
            locator,
            decoder,
        })
    }

    fn key_of(&self, id: &str) -> Option<AssetKey> {
        AssetId::parse(id)
            .ok()
            .map(|id| id.resolve(&self.config.default_scheme))
    }

    fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        // Detached; the JoinHandle is not needed.
        let _ = self.handle.spawn_blocking(task);
    }

    /// Loads `id` on the calling thread, blocking for the duration of I/O and
    /// decoding.
    ///
    /// A cache hit returns immediately. If another request is already loading
    /// the same entry, this call waits for it instead of loading twice. A
    /// locator without synchronous support can only satisfy the call through
    /// such an existing entry.
    pub fn load(&self, id: &str) -> Result<AssetHandle, AssetError> {
        let route = self.route(id)?;
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let waiter: Waiter = Box::new(move |outcome| {
            let _ = sender.send(outcome);
        });

        let acquired = if route.locator.supports_synchronous() {
            self.cache.acquire(&route.key, waiter)
        } else {
            self.cache.join(&route.key, waiter)
        };
        match acquired {
            Acquire::Ready(handle, _) => return Ok(handle),
            Acquire::Waiting => log::debug!("Waiting on in-flight load of '{}'.", route.key),
            Acquire::Load(ticket) => {
                let guard = LoadGuard::new(self.cache.clone(), route.key.clone(), ticket);
                guard.complete(self.locate_and_decode(&route));
            }
            Acquire::Absent(_) => {
                return Err(AssetError::LocateUnsupported {
                    scheme: route.key.scheme().to_string(),
                    mode: LocateMode::Synchronous,
                })
            }
        }

        receiver
            .recv()
            .unwrap_or_else(|_| Err(AssetError::Cancelled { key: route.key }))
    }

    fn locate_and_decode(&self, route: &Route) -> Result<Arc<dyn Asset>, AssetError> {
        log::debug!("Locating '{}'.", route.key);
        let stream = match route.locator.locate(route.key.path()) {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                return Err(AssetError::LocateFailed {
                    key: route.key.clone(),
                    reason: LocateError::NotFound,
                })
            }
            Err(e) => {
                return Err(AssetError::from_locate(
                    &route.key,
                    e,
                    LocateMode::Synchronous,
                ))
            }
        };
        decode(&*route.decoder, stream, &route.extension, &route.key)
    }

    /// Loads `id` without blocking. `on_done` is never invoked on the calling
    /// thread.
    ///
    /// Concurrent requests for the same entry share a single load and are
    /// notified in the order they were made. `on_done` runs on the thread that
    /// settles the entry: a manager worker thread for cache hits, routing
    /// failures and loads started here, but the caller's thread of a blocking
    /// [`load`](Self::load) that was already in flight, or the thread calling
    /// [`unload_all_assets`](Self::unload_all_assets) for a cancelled load.
    pub fn load_async(
        &self,
        id: &str,
        on_done: impl FnOnce(Result<AssetHandle, AssetError>) + Send + 'static,
    ) {
        self.submit(id, Box::new(on_done));
    }

    /// Like [`load_async`](Self::load_async) with separate success and
    /// failure continuations.
    pub fn load_with(
        &self,
        id: &str,
        on_success: impl FnOnce(AssetHandle) + Send + 'static,
        on_failure: impl FnOnce(AssetError) + Send + 'static,
    ) {
        self.load_async(id, move |outcome| match outcome {
            Ok(handle) => on_success(handle),
            Err(e) => on_failure(e),
        });
    }

    /// Starts loading `id` and returns a [`PendingLoad`] to poll or wait on.
    pub fn request(&self, id: &str) -> PendingLoad {
        let key = self
            .key_of(id)
            .unwrap_or_else(|| AssetKey::new(&self.config.default_scheme, id));
        let (pending, waiter) = PendingLoad::channel(key);
        self.submit(id, waiter);
        pending
    }

    fn submit(&self, id: &str, waiter: Waiter) {
        let route = match self.route(id) {
            Ok(route) => route,
            Err(e) => {
                log::debug!("Rejected '{id}': {e}");
                self.dispatch(move || waiter(Err(e)));
                return;
            }
        };

        let acquired = if route.locator.supports_asynchronous() {
            self.cache.acquire(&route.key, waiter)
        } else {
            self.cache.join(&route.key, waiter)
        };
        match acquired {
            Acquire::Ready(handle, waiter) => self.dispatch(move || waiter(Ok(handle))),
            Acquire::Waiting => log::debug!("Joined in-flight load of '{}'.", route.key),
            Acquire::Absent(waiter) => {
                let e = AssetError::LocateUnsupported {
                    scheme: route.key.scheme().to_string(),
                    mode: LocateMode::Asynchronous,
                };
                self.dispatch(move || waiter(Err(e)));
            }
            Acquire::Load(ticket) => {
                let guard = LoadGuard::new(self.cache.clone(), route.key.clone(), ticket);
                self.dispatch(move || {
                    let Route {
                        key,
                        extension,
                        locator,
                        decoder,
                    } = route;
                    log::debug!("Locating '{key}' asynchronously.");
                    // The guard travels with the callback, so a locator that
                    // panics or never calls back still settles the entry.
                    let name = key.path().to_string();
                    locator.locate_async(
                        &name,
                        Box::new(move |located| {
                            let result = located
                                .map_err(|e| {
                                    AssetError::from_locate(&key, e, LocateMode::Asynchronous)
                                })
                                .and_then(|stream| decode(&*decoder, stream, &extension, &key));
                            guard.complete(result);
                        }),
                    );
                });
            }
        }
    }

    /// Drops one reference to `id`. The entry stays cached at zero references
    /// until it is unloaded.
    pub fn release(&self, id: &str) -> bool {
        self.key_of(id)
            .is_some_and(|key| self.cache.release(&key))
    }

    /// Evicts `id` regardless of its reference count, frees its host memory
    /// and queues its device-side state for deletion.
    pub fn unload(&self, id: &str) -> bool {
        match self.key_of(id).and_then(|key| self.cache.unload(&key)) {
            Some(handle) => {
                self.deletions.push(handle);
                true
            }
            None => false,
        }
    }

    /// Empties the cache.
    ///
    /// Pending loads are cancelled (their waiters receive
    /// [`AssetError::Cancelled`]), host memory of every ready entry is freed
    /// and device-side state is queued for
    /// [`flush_device_deletions`](Self::flush_device_deletions). Returns the
    /// number of ready entries evicted; a second call returns zero.
    pub fn unload_all_assets(&self) -> usize {
        let evicted = self.cache.unload_all();
        let count = evicted.len();
        for handle in evicted {
            self.deletions.push(handle);
        }
        count
    }

    /// Deletes queued device-side state. Must be called by the device owner.
    pub fn flush_device_deletions(&self, device: &mut dyn DeviceContext) -> usize {
        let deleted = self.deletions.flush(device);
        if deleted > 0 {
            log::debug!("Deleted {deleted} device objects.");
        }
        deleted
    }

    /// Runs both release phases for every cached resource from the device
    /// owner's context. Returns the number of device objects deleted.
    pub fn unload_all_assets_on_device(&self, device: &mut dyn DeviceContext) -> usize {
        self.unload_all_assets();
        self.flush_device_deletions(device)
    }

    /// Number of device objects waiting for deletion.
    pub fn pending_device_deletions(&self) -> usize {
        self.deletions.len()
    }

    /// Whether `id` is cached and ready.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.state(id) == Some(LoadState::Ready)
    }

    /// The cache state of `id`, if it has an entry.
    pub fn state(&self, id: &str) -> Option<LoadState> {
        self.key_of(id).and_then(|key| self.cache.state(&key))
    }

    /// The reference count of `id`, if it is ready.
    pub fn ref_count(&self, id: &str) -> Option<usize> {
        self.key_of(id).and_then(|key| self.cache.ref_count(&key))
    }

    /// Number of cache entries, pending ones included.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Drop for AssetManager {
    fn drop(&mut self) {
        self.unload_all_assets();
        if !self.deletions.is_empty() {
            log::warn!(
                "Asset manager dropped with {} device objects never deleted.",
                self.deletions.len()
            );
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
