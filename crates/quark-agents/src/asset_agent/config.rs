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

use anyhow::{Context, Result};
use quark_core::asset::DeviceCapabilities;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Configuration of an [`AssetManager`](super::AssetManager), usually read
/// from a RON file. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    /// Scheme assumed for identifiers without one; the filesystem locator is
    /// registered under it.
    pub default_scheme: String,
    /// Root directory of the filesystem locator.
    pub root: PathBuf,
    /// Number of async worker threads of the manager's runtime.
    pub worker_threads: usize,
    /// Embedded pack archive, if any.
    pub pack: Option<PackConfig>,
    /// Remote HTTP source, if any.
    pub remote: Option<RemoteConfig>,
    /// What the target device can realize; captured by the default decoders.
    pub capabilities: DeviceCapabilities,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            default_scheme: "INTERNAL".to_string(),
            root: PathBuf::from("assets"),
            worker_threads: 2,
            pack: None,
            remote: None,
            capabilities: DeviceCapabilities::default(),
        }
    }
}

/// Location of a pack archive and the scheme it is mounted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Scheme the pack locator is registered under.
    #[serde(default = "PackConfig::default_scheme")]
    pub scheme: String,
    /// Path of `index.bin`.
    pub index: PathBuf,
    /// Path of `data.pack`.
    pub data: PathBuf,
}

impl PackConfig {
    fn default_scheme() -> String {
        "EMBEDDED".to_string()
    }
}

/// A remote HTTP source and the scheme it is mounted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Scheme the HTTP locator is registered under.
    #[serde(default = "RemoteConfig::default_scheme")]
    pub scheme: String,
    /// URL resource names are resolved against.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "RemoteConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl RemoteConfig {
    fn default_scheme() -> String {
        "REMOTE".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10_000
    }
}

impl AssetConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::de::from_str(text).context("Failed to parse asset configuration")
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read asset configuration '{}'", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("Invalid configuration in '{}'", path.display()))
    }
}
