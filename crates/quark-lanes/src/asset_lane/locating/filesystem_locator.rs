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
    fs::File,
    io::{self, BufReader},
    path::{Component, Path, PathBuf},
};

/// Locates resources as files below a root directory.
///
/// Supports both modes. The asynchronous path performs the read on the
/// calling thread, so callers are expected to invoke it from a worker pool.
#[derive(Debug, Clone)]
pub struct FileSystemLocator {
    root: PathBuf,
}

impl FileSystemLocator {
    /// Creates a locator rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory names are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `name` to a path below the root. Names that would escape it
    /// (absolute paths, `..` segments) do not resolve.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        (!escapes).then(|| self.root.join(relative))
    }

    fn open(&self, name: &str) -> Result<ByteStream, LocateError> {
        let path = self.resolve(name).ok_or(LocateError::NotFound)?;
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LocateError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

impl AssetLocator for FileSystemLocator {
    fn supports_synchronous(&self) -> bool {
        true
    }

    fn supports_asynchronous(&self) -> bool {
        true
    }

    fn locate(&self, name: &str) -> Result<Option<ByteStream>, LocateError> {
        match self.open(name) {
            Ok(stream) => Ok(Some(stream)),
            Err(e) => {
                log::debug!("'{name}' not found under '{}': {e}", self.root.display());
                Ok(None)
            }
        }
    }

    fn locate_async(&self, name: &str, on_done: LocateCallback) {
        on_done(self.open(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Read};
    use tempfile::tempdir;

    #[test]
    fn test_locate_reads_file_below_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shaders")).unwrap();
        fs::write(dir.path().join("shaders/basic.pipeline"), b"@vertex").unwrap();

        let locator = FileSystemLocator::new(dir.path());
        let mut stream = locator.locate("shaders/basic.pipeline").unwrap().unwrap();
        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        assert_eq!(text, "@vertex");
    }

    #[test]
    fn test_missing_file_is_none_synchronously_and_not_found_asynchronously() {
        let dir = tempdir().unwrap();
        let locator = FileSystemLocator::new(dir.path());
        assert!(locator.locate("missing.png").unwrap().is_none());

        let (tx, rx) = crossbeam_channel::bounded(1);
        locator.locate_async(
            "missing.png",
            Box::new(move |result| {
                let _ = tx.send(result.map(|_| ()));
            }),
        );
        assert_eq!(rx.recv().unwrap(), Err(LocateError::NotFound));
    }

    #[test]
    fn test_names_escaping_root_do_not_resolve() {
        let outer = tempdir().unwrap();
        fs::write(outer.path().join("secret.txt"), b"x").unwrap();
        fs::create_dir_all(outer.path().join("root")).unwrap();

        let locator = FileSystemLocator::new(outer.path().join("root"));
        assert!(locator.locate("../secret.txt").unwrap().is_none());
        let absolute = outer.path().join("secret.txt");
        assert!(locator.locate(absolute.to_str().unwrap()).unwrap().is_none());
    }
}
