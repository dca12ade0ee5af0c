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

use crate::asset_lane::{PackIndex, DATA_FILE_NAME, INDEX_FILE_NAME};
use anyhow::{Context, Result};
use quark_core::asset::{AssetLocator, ByteStream, LocateError};
use std::{
    fs::{self, File},
    io::{Cursor, Read, Seek, SeekFrom},
    path::Path,
    sync::{Mutex, PoisonError},
};

/// Locates resources inside a read-only pack archive.
///
/// Synchronous only: reads seek a shared file handle, which the locator
/// serialises behind a mutex.
#[derive(Debug)]
pub struct PackLocator {
    index: PackIndex,
    data: Mutex<File>,
}

impl PackLocator {
    /// Opens an archive from its index and data files.
    pub fn open(index_path: &Path, data_path: &Path) -> Result<Self> {
        let index_bytes = fs::read(index_path)
            .with_context(|| format!("Failed to read pack index '{}'", index_path.display()))?;
        let index = PackIndex::from_bytes(&index_bytes)
            .with_context(|| format!("Failed to parse pack index '{}'", index_path.display()))?;
        let data = File::open(data_path)
            .with_context(|| format!("Failed to open data pack '{}'", data_path.display()))?;
        log::debug!(
            "Opened pack '{}' with {} entries.",
            data_path.display(),
            index.len()
        );
        Ok(Self::new(index, data))
    }

    /// Opens the `index.bin` / `data.pack` pair found in `dir`.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        Self::open(&dir.join(INDEX_FILE_NAME), &dir.join(DATA_FILE_NAME))
    }

    /// Creates a locator over an already decoded index and an open data file.
    pub fn new(index: PackIndex, data: File) -> Self {
        Self {
            index,
            data: Mutex::new(data),
        }
    }

    /// The archive's index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    fn read(&self, offset: u64, size: u64) -> std::io::Result<Vec<u8>> {
        let mut buffer = vec![0; size as usize];
        let mut file = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

impl AssetLocator for PackLocator {
    fn supports_synchronous(&self) -> bool {
        true
    }

    fn supports_asynchronous(&self) -> bool {
        false
    }

    fn locate(&self, name: &str) -> Result<Option<ByteStream>, LocateError> {
        let Some(entry) = self.index.get(name) else {
            return Ok(None);
        };
        match self.read(entry.offset, entry.size) {
            Ok(bytes) => Ok(Some(Box::new(Cursor::new(bytes)))),
            Err(e) => {
                log::warn!("Failed to read '{name}' from pack: {e}");
                Ok(None)
            }
        }
    }
}
