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

use super::LocateError;
use std::io::Read;

/// A readable stream of raw resource bytes.
pub type ByteStream = Box<dyn Read + Send>;

/// The single-fire continuation of an asynchronous locate.
pub type LocateCallback = Box<dyn FnOnce(Result<ByteStream, LocateError>) + Send>;

/// A trait for types that resolve a logical resource name to a byte stream.
///
/// This represents the "discovery" half of an asset load. Implementors decide
/// where bytes come from (a directory, a pack archive, a web server) and which
/// of the two modes they can honour. A locator is registered once and then
/// invoked from several threads, so it must be stateless or synchronize
/// internally.
pub trait AssetLocator: Send + Sync {
    /// Whether [`locate`](Self::locate) is implemented.
    fn supports_synchronous(&self) -> bool;

    /// Whether [`locate_async`](Self::locate_async) is implemented.
    fn supports_asynchronous(&self) -> bool;

    /// Resolves `name` on the caller's thread.
    ///
    /// # Returns
    /// - `Ok(Some(stream))` when the resource was found.
    /// - `Ok(None)` when the name does not resolve or cannot be read.
    /// - `Err(LocateError::NotSupported)` when synchronous mode is unsupported.
    fn locate(&self, name: &str) -> Result<Option<ByteStream>, LocateError>;

    /// Resolves `name` and reports the outcome through `on_done`.
    ///
    /// `on_done` is invoked exactly once, with a stream on success or with the
    /// failure otherwise. The call must not block beyond issuing the
    /// underlying request.
    fn locate_async(&self, name: &str, on_done: LocateCallback) {
        let _ = name;
        on_done(Err(LocateError::NotSupported));
    }
}
