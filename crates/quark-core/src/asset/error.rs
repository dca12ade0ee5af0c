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

//! Defines the error taxonomy of the asset pipeline.
//!
//! Every error is `Clone` because one failed load is reported to every waiter
//! queued on it.

use super::AssetKey;
use std::fmt;
use thiserror::Error;

/// Which locator mode a request needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateMode {
    /// A blocking `locate` on the caller's thread.
    Synchronous,
    /// A `locate_async` completing through a callback.
    Asynchronous,
}

impl fmt::Display for LocateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateMode::Synchronous => f.write_str("synchronous"),
            LocateMode::Asynchronous => f.write_str("asynchronous"),
        }
    }
}

/// A failure reported by an [`AssetLocator`](super::AssetLocator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// The locator does not implement the requested mode.
    #[error("operation not supported by this locator")]
    NotSupported,
    /// The name does not resolve to any resource.
    #[error("resource not found")]
    NotFound,
    /// Reading the resource failed.
    #[error("i/o error: {0}")]
    Io(String),
    /// A network transport answered with a non-success status.
    #[error("transport returned status {status}")]
    Transport {
        /// The status code the transport answered with.
        status: u16,
    },
}

impl From<std::io::Error> for LocateError {
    fn from(value: std::io::Error) -> Self {
        LocateError::Io(value.to_string())
    }
}

/// A failure reported by an [`AssetDecoder`](super::AssetDecoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes do not match the expected container magic or header.
    #[error("malformed asset: {0}")]
    Malformed(String),
    /// The container is recognised but encodes a variant that is not implemented.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
}

impl DecodeError {
    /// Shorthand for [`DecodeError::Malformed`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        DecodeError::Malformed(msg.into())
    }

    /// Shorthand for [`DecodeError::UnsupportedFeature`].
    pub fn unsupported(msg: impl Into<String>) -> Self {
        DecodeError::UnsupportedFeature(msg.into())
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        DecodeError::Malformed(format!("failed to read stream: {value}"))
    }
}

/// The error surfaced to callers of the asset manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The identifier could not be parsed.
    #[error("invalid asset identifier '{0}'")]
    InvalidIdentifier(String),
    /// No locator is registered for the identifier's scheme.
    #[error("no locator registered for scheme '{0}'")]
    UnknownScheme(String),
    /// No decoder is registered for the identifier's extension.
    #[error("no decoder registered for extension '{0}'")]
    UnknownExtension(String),
    /// The resolved locator does not support the requested mode.
    #[error("locator for scheme '{scheme}' does not support {mode} loading")]
    LocateUnsupported {
        /// The scheme of the locator.
        scheme: String,
        /// The mode that was requested.
        mode: LocateMode,
    },
    /// The locator could not produce the resource.
    #[error("failed to locate '{key}': {reason}")]
    LocateFailed {
        /// The entry that failed.
        key: AssetKey,
        /// What the locator reported.
        reason: LocateError,
    },
    /// The decoder rejected the resource bytes.
    #[error("failed to decode '{key}': {source}")]
    DecodeFailed {
        /// The entry that failed.
        key: AssetKey,
        /// What the decoder reported.
        source: DecodeError,
    },
    /// The load was still in flight when the cache was torn down.
    #[error("load of '{key}' was cancelled")]
    Cancelled {
        /// The entry that was cancelled.
        key: AssetKey,
    },
    /// The load ended without producing a result, because its locator or
    /// decoder panicked or the locator dropped its callback.
    #[error("load of '{key}' ended without a result")]
    Abandoned {
        /// The entry whose load was abandoned.
        key: AssetKey,
    },
}

impl AssetError {
    /// Maps a locator failure to the error reported for `key`.
    pub fn from_locate(key: &AssetKey, reason: LocateError, mode: LocateMode) -> Self {
        match reason {
            LocateError::NotSupported => AssetError::LocateUnsupported {
                scheme: key.scheme().to_string(),
                mode,
            },
            reason => AssetError::LocateFailed {
                key: key.clone(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_supported_maps_to_locate_unsupported() {
        let key = AssetKey::new("REMOTE", "a.png");
        let err = AssetError::from_locate(&key, LocateError::NotSupported, LocateMode::Synchronous);
        assert_eq!(
            err,
            AssetError::LocateUnsupported {
                scheme: "REMOTE".to_string(),
                mode: LocateMode::Synchronous,
            }
        );
    }

    #[test]
    fn test_other_locate_errors_map_to_locate_failed() {
        let key = AssetKey::new("INTERNAL", "missing.png");
        let err = AssetError::from_locate(&key, LocateError::NotFound, LocateMode::Asynchronous);
        assert!(matches!(err, AssetError::LocateFailed { reason: LocateError::NotFound, .. }));
        assert_eq!(err.to_string(), "failed to locate 'INTERNAL:missing.png': resource not found");
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::unsupported("DX10 header");
        assert_eq!(err.to_string(), "unsupported feature: DX10 header");
    }
}
