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

//! The embedded pack archive: a flat `data.pack` blob plus a bincode-encoded
//! `index.bin` listing where each named resource lives inside it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// File name of the archive index inside a pack directory.
pub const INDEX_FILE_NAME: &str = "index.bin";
/// File name of the archive payload inside a pack directory.
pub const DATA_FILE_NAME: &str = "data.pack";

/// Location of one resource inside `data.pack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    /// The name the resource is located by, `/`-separated.
    pub path: String,
    /// Byte offset of the resource in the data file.
    pub offset: u64,
    /// Size of the resource in bytes.
    pub size: u64,
}

/// Errors raised while reading or writing a pack index.
#[derive(Debug, Error)]
pub enum PackError {
    /// The index bytes are not a bincode-encoded entry list.
    #[error("invalid pack index: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The entry list could not be encoded.
    #[error("failed to encode pack index: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

/// The in-memory lookup table of a pack archive.
#[derive(Debug, Default)]
pub struct PackIndex {
    entries: HashMap<String, PackEntry>,
}

impl PackIndex {
    /// Decodes an index from the contents of `index.bin`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackError> {
        let (entries, _): (Vec<PackEntry>, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.path.clone(), entry))
                .collect(),
        })
    }

    /// Encodes the entries, sorted by offset.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackError> {
        let mut entries: Vec<&PackEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.offset);
        Ok(bincode::serde::encode_to_vec(
            &entries,
            bincode::config::standard(),
        )?)
    }

    /// Looks up a resource by name.
    pub fn get(&self, path: &str) -> Option<&PackEntry> {
        self.entries.get(path)
    }

    /// Number of resources in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What [`PackBuilder::write`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    /// Path of the written index file.
    pub index_path: PathBuf,
    /// Path of the written data file.
    pub data_path: PathBuf,
    /// Number of packed resources.
    pub entries: usize,
    /// Size of the data file in bytes.
    pub data_bytes: u64,
}

/// Accumulates resources and writes them out as a pack archive.
#[derive(Debug, Default)]
pub struct PackBuilder {
    index: PackIndex,
    data: Vec<u8>,
}

impl PackBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource under `path`. A second resource with the same path
    /// shadows the first one in the index.
    pub fn add(&mut self, path: impl Into<String>, bytes: &[u8]) -> &mut Self {
        let path = path.into().replace('\\', "/");
        let entry = PackEntry {
            path: path.clone(),
            offset: self.data.len() as u64,
            size: bytes.len() as u64,
        };
        self.data.extend_from_slice(bytes);
        if self.index.entries.insert(path, entry).is_some() {
            log::warn!("Pack entry was added twice; the last one wins.");
        }
        self
    }

    /// Recursively adds every file under `root`, named by its path relative
    /// to `root`. Returns the number of files added.
    pub fn add_directory(&mut self, root: &Path) -> Result<usize> {
        let mut added = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to walk '{}'", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .context("Walked outside of the pack source directory")?;
            let name = relative
                .to_str()
                .with_context(|| format!("Invalid path encoding: '{}'", relative.display()))?;
            let bytes = fs::read(entry.path())
                .with_context(|| format!("Failed to read asset file '{}'", entry.path().display()))?;
            self.add(name, &bytes);
            added += 1;
        }
        log::debug!("Collected {added} files from '{}'.", root.display());
        Ok(added)
    }

    /// Writes `index.bin` and `data.pack` into `dest_dir`, creating it if needed.
    pub fn write(&self, dest_dir: &Path) -> Result<PackSummary> {
        fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create '{}'", dest_dir.display()))?;
        let index_path = dest_dir.join(INDEX_FILE_NAME);
        let data_path = dest_dir.join(DATA_FILE_NAME);

        fs::write(&data_path, &self.data)
            .with_context(|| format!("Failed to write data pack to '{}'", data_path.display()))?;
        let index_bytes = self
            .index
            .to_bytes()
            .context("Failed to serialize pack index")?;
        fs::write(&index_path, &index_bytes)
            .with_context(|| format!("Failed to write index file to '{}'", index_path.display()))?;

        log::info!(
            "Wrote {} pack entries ({} bytes) to '{}'.",
            self.index.len(),
            self.data.len(),
            dest_dir.display()
        );
        Ok(PackSummary {
            index_path,
            data_path,
            entries: self.index.len(),
            data_bytes: self.data.len() as u64,
        })
    }
}
