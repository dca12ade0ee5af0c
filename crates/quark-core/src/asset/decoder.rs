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

use super::{Asset, ByteStream, DecodeError};
use std::sync::Arc;

/// A trait for types that parse a byte stream into a decoded resource.
///
/// This represents the CPU-bound half of an asset load. Decoders are pure
/// functions of their input plus whatever configuration was captured when
/// they were built (for example the device capabilities that decide which
/// texture path to emit); they hold no per-asset state between calls.
pub trait AssetDecoder: Send + Sync {
    /// Parses `stream` into a resource.
    ///
    /// `extension` is the lower-cased extension the decoder was selected by,
    /// which lets a decoder registered under several aliases tell them apart.
    ///
    /// # Errors
    /// - [`DecodeError::Malformed`] when the bytes don't match the container.
    /// - [`DecodeError::UnsupportedFeature`] when the container encodes a
    ///   variant the decoder does not implement.
    fn decode(&self, stream: ByteStream, extension: &str) -> Result<Arc<dyn Asset>, DecodeError>;
}
