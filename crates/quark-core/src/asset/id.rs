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

//! Identifier syntax: `[scheme:]path[.extension]`.

use super::AssetError;
use std::{fmt, str::FromStr, sync::Arc};

/// A parsed asset identifier.
///
/// The scheme selects the locator, the extension selects the decoder and the
/// path is what the locator receives. An identifier without a scheme is
/// resolved against the manager's default scheme by [`AssetId::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId {
    scheme: Option<String>,
    path: String,
    extension: Option<String>,
}

impl AssetId {
    /// Parses an identifier string.
    ///
    /// # Errors
    /// Returns [`AssetError::InvalidIdentifier`] when the path part is empty.
    pub fn parse(identifier: &str) -> Result<Self, AssetError> {
        let (scheme, path) = match identifier.split_once(':') {
            Some((prefix, rest)) if is_scheme(prefix, rest) => (Some(prefix.to_string()), rest),
            _ => (None, identifier),
        };

        if path.is_empty() {
            return Err(AssetError::InvalidIdentifier(identifier.to_string()));
        }

        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let extension = match file_name.rfind('.') {
            Some(0) | None => None,
            Some(dot) if dot + 1 == file_name.len() => None,
            Some(dot) => Some(file_name[dot + 1..].to_ascii_lowercase()),
        };

        Ok(Self {
            scheme,
            path: path.to_string(),
            extension,
        })
    }

    /// The explicit scheme, if the identifier carried one.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// The path handed to the locator.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The lower-cased extension without its leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Builds the cache key, filling in `default_scheme` when none was given.
    pub fn resolve(&self, default_scheme: &str) -> AssetKey {
        AssetKey::new(self.scheme().unwrap_or(default_scheme), &self.path)
    }
}

impl FromStr for AssetId {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// A one-letter prefix followed by a separator is a drive letter, not a scheme.
fn is_scheme(prefix: &str, rest: &str) -> bool {
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return false;
    }
    !(prefix.len() == 1 && rest.starts_with(['/', '\\']))
}

/// The key of a cache entry: a scheme and a path.
///
/// Two identifiers that resolve to the same scheme and path share a single
/// cache entry. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    scheme: Arc<str>,
    path: Arc<str>,
}

impl AssetKey {
    /// Creates a key from its two parts.
    pub fn new(scheme: &str, path: &str) -> Self {
        Self {
            scheme: Arc::from(scheme),
            path: Arc::from(path),
        }
    }

    /// The scheme naming the locator that owns this entry.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The locator-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

impl fmt::Debug for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_scheme() {
        let id = AssetId::parse("INTERNAL:sound.wav").unwrap();
        assert_eq!(id.scheme(), Some("INTERNAL"));
        assert_eq!(id.path(), "sound.wav");
        assert_eq!(id.extension(), Some("wav"));
    }

    #[test]
    fn test_parse_without_scheme_uses_default() {
        let id = AssetId::parse("textures/missing.png").unwrap();
        assert_eq!(id.scheme(), None);
        assert_eq!(id.resolve("INTERNAL"), AssetKey::new("INTERNAL", "textures/missing.png"));
    }

    #[test]
    fn test_extension_is_lowercased_and_taken_from_last_dot() {
        let id = AssetId::parse("archive.tar.GZ").unwrap();
        assert_eq!(id.extension(), Some("gz"));
    }

    #[test]
    fn test_extension_absent() {
        assert_eq!(AssetId::parse("Makefile").unwrap().extension(), None);
        assert_eq!(AssetId::parse("dir.d/.hidden").unwrap().extension(), None);
        assert_eq!(AssetId::parse("trailing.").unwrap().extension(), None);
    }

    #[test]
    fn test_dot_in_directory_is_not_an_extension() {
        let id = AssetId::parse("shaders.v2/basic").unwrap();
        assert_eq!(id.extension(), None);
    }

    #[test]
    fn test_drive_letter_is_not_a_scheme() {
        let id = AssetId::parse("C:\\assets\\a.png").unwrap();
        assert_eq!(id.scheme(), None);
        assert_eq!(id.path(), "C:\\assets\\a.png");
    }

    #[test]
    fn test_invalid_scheme_chars_keep_whole_path() {
        let id = AssetId::parse("a b:c.png").unwrap();
        assert_eq!(id.scheme(), None);
        assert_eq!(id.path(), "a b:c.png");
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(matches!(
            AssetId::parse("INTERNAL:"),
            Err(AssetError::InvalidIdentifier(_))
        ));
        assert!(AssetId::parse("").is_err());
    }

    #[test]
    fn test_key_display() {
        let key = AssetKey::new("REMOTE", "ui/atlas.png");
        assert_eq!(key.to_string(), "REMOTE:ui/atlas.png");
    }
}
