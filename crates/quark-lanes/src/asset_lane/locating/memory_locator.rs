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

use quark_core::asset::{AssetLocator, ByteStream, LocateCallback, LocateError};
use std::{
    collections::HashMap,
    io::Cursor,
    sync::{Arc, PoisonError, RwLock},
};

/// Locates resources held in memory, keyed by name.
///
/// Useful for generated or embedded resources and for tests. Both modes
/// complete on the calling thread.
#[derive(Debug, Default)]
pub struct MemoryLocator {
    entries: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryLocator {
    /// Creates an empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` under `name`, returning whether a previous value was replaced.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), bytes.into())
            .is_some()
    }

    /// Removes `name`, returning whether it was present.
    pub fn remove(&self, name: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    fn get(&self, name: &str) -> Option<Arc<[u8]>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl AssetLocator for MemoryLocator {
    fn supports_synchronous(&self) -> bool {
        true
    }

    fn supports_asynchronous(&self) -> bool {
        true
    }

    fn locate(&self, name: &str) -> Result<Option<ByteStream>, LocateError> {
        Ok(self
            .get(name)
            .map(|bytes| Box::new(Cursor::new(bytes)) as ByteStream))
    }

    fn locate_async(&self, name: &str, on_done: LocateCallback) {
        on_done(match self.get(name) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(LocateError::NotFound),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_insert_locate_remove() {
        let locator = MemoryLocator::new();
        assert!(!locator.insert("a.bin", vec![1u8, 2, 3]));
        assert!(locator.insert("a.bin", vec![4u8]));

        let mut bytes = Vec::new();
        locator
            .locate("a.bin")
            .unwrap()
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        assert_eq!(bytes, [4]);

        assert!(locator.remove("a.bin"));
        assert!(locator.locate("a.bin").unwrap().is_none());
    }

    #[test]
    fn test_async_reports_exactly_once() {
        let locator = MemoryLocator::new();
        locator.insert("a.bin", vec![7u8]);

        let (tx, rx) = crossbeam_channel::unbounded();
        let tx2 = tx.clone();
        locator.locate_async("a.bin", Box::new(move |r| tx.send(r.is_ok()).unwrap()));
        locator.locate_async("b.bin", Box::new(move |r| tx2.send(r.is_ok()).unwrap()));

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![true, false]);
    }
}
