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

use super::{Asset, AssetKey};
use std::{fmt, ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a decoded asset.
///
/// This acts as a shared, non-owning view of a cache entry: the cache keeps
/// the resource alive while the entry exists, and cloning a handle only bumps
/// the `Arc` count. Handles do not take part in the cache's own reference
/// count; callers balance every successful load with
/// `AssetManager::release`.
#[derive(Clone)]
pub struct AssetHandle {
    key: AssetKey,
    asset: Arc<dyn Asset>,
}

impl AssetHandle {
    /// Wraps a freshly decoded asset under the key it was loaded for.
    ///
    /// This is typically called by the cache once a load has completed.
    pub fn new(key: AssetKey, asset: Arc<dyn Asset>) -> Self {
        Self { key, asset }
    }

    /// The cache key this handle was loaded under.
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Returns the concrete resource if it is of type `T`.
    pub fn downcast_ref<T: Asset>(&self) -> Option<&T> {
        self.asset.as_any().downcast_ref::<T>()
    }

    /// Whether both handles point at the very same resource instance.
    pub fn ptr_eq(&self, other: &AssetHandle) -> bool {
        Arc::ptr_eq(&self.asset, &other.asset)
    }
}

impl Deref for AssetHandle {
    type Target = dyn Asset;

    fn deref(&self) -> &Self::Target {
        self.asset.as_ref()
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AssetHandle {}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("key", &self.key)
            .field("kind", &self.asset.kind())
            .finish()
    }
}
