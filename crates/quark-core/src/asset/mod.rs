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

//! Provides the foundational traits and primitive types for Quark's asset system.
//!
//! This module defines the "common language" shared by every stage of the
//! pipeline. It contains the contracts that the locators, decoders, cache and
//! manager implement or consume, but it has no knowledge of how assets are
//! found on disk, parsed, or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: the capability set every decoded resource exposes.
//! - [`AssetId`] / [`AssetKey`]: parsed identifiers and the cache key derived from them.
//! - [`AssetLocator`] and [`AssetDecoder`]: the two pluggable stages of a load.
//! - [`HostMemory`] and [`DeviceState`]: the two independently releasable memory
//!   classes of a resource.

mod capabilities;
mod decoder;
mod disposal;
mod error;
mod handle;
mod id;
mod locator;
mod memory;
pub mod resources;

pub use capabilities::*;
pub use decoder::*;
pub use disposal::*;
pub use error::*;
pub use handle::*;
pub use id::*;
pub use locator::*;
pub use memory::*;

use std::any::Any;

/// The broad family a decoded resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Image-backed texture data.
    Texture,
    /// Sample-backed audio data.
    Audio,
    /// Source-backed shader stages.
    Shader,
    /// Anything registered by an application-specific decoder.
    Other,
}

/// The capability set of a decoded resource managed by the asset system.
///
/// Every resource carries two independently releasable memory classes:
/// host-side staging data (the decoded bytes) and device-side state created
/// lazily by the device layer on first use. Releasing one never affects the
/// other, and both releases are idempotent.
///
/// The supertraits enforce the guarantees needed by the pipeline:
/// - `Send` + `Sync`: a resource is decoded on an I/O thread and read from any
///   other thread once published.
/// - `'static`: the resource can live in the cache for the lifetime of the
///   application.
///
/// # Examples
///
/// ```
/// use quark_core::asset::{Asset, AssetKind, HostMemory};
/// use std::any::Any;
///
/// struct Blob {
///     bytes: HostMemory<Vec<u8>>,
/// }
///
/// impl Asset for Blob {
///     fn kind(&self) -> AssetKind {
///         AssetKind::Other
///     }
///
///     fn release_host_memory(&self) {
///         self.bytes.release();
///     }
///
///     fn host_memory_bytes(&self) -> usize {
///         self.bytes.with(|b| b.len()).unwrap_or(0)
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait Asset: Send + Sync + 'static {
    /// The family of this resource.
    fn kind(&self) -> AssetKind;

    /// Whether the resource is fed to the device incrementally rather than
    /// decoded at once.
    fn is_streaming(&self) -> bool {
        false
    }

    /// The device-side slot of this resource, if it has one.
    fn device_state(&self) -> Option<&DeviceState> {
        None
    }

    /// Whether this resource owns device-side state at all.
    fn has_device_state(&self) -> bool {
        self.device_state().is_some()
    }

    /// Frees the host-side staging data. Calling it more than once is a no-op.
    fn release_host_memory(&self);

    /// The number of staging bytes currently held on the host.
    fn host_memory_bytes(&self) -> usize;

    /// Upcast used by [`AssetHandle::downcast_ref`].
    fn as_any(&self) -> &dyn Any;
}
