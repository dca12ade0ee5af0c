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

//! Scheme and extension registries resolving an identifier to the locator
//! and decoder that serve it.

use quark_core::asset::{AssetDecoder, AssetLocator};
use std::{collections::HashMap, sync::Arc};

/// Locators keyed by scheme. The last registration for a scheme wins.
#[derive(Default)]
pub(crate) struct LocatorRegistry {
    locators: HashMap<String, Arc<dyn AssetLocator>>,
}

impl LocatorRegistry {
    pub(crate) fn register(&mut self, scheme: &str, locator: Arc<dyn AssetLocator>) {
        if self.locators.insert(scheme.to_string(), locator).is_some() {
            log::warn!("Replacing the locator registered for scheme '{scheme}'.");
        } else {
            log::debug!("Registered locator for scheme '{scheme}'.");
        }
    }

    pub(crate) fn get(&self, scheme: &str) -> Option<Arc<dyn AssetLocator>> {
        self.locators.get(scheme).cloned()
    }
}

/// Decoders keyed by lower-cased extension, without the leading dot.
#[derive(Default)]
pub(crate) struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn AssetDecoder>>,
}

impl DecoderRegistry {
    /// Binds `decoder` to every extension in `extensions`.
    pub(crate) fn register(&mut self, decoder: Arc<dyn AssetDecoder>, extensions: &[&str]) {
        for extension in extensions {
            let extension = normalize(extension);
            if self
                .decoders
                .insert(extension.clone(), decoder.clone())
                .is_some()
            {
                log::warn!("Replacing the decoder registered for extension '{extension}'.");
            } else {
                log::debug!("Registered decoder for extension '{extension}'.");
            }
        }
    }

    pub(crate) fn get(&self, extension: &str) -> Option<Arc<dyn AssetDecoder>> {
        self.decoders.get(&normalize(extension)).cloned()
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_core::asset::{Asset, ByteStream, DecodeError};

    struct Named(&'static str);

    impl AssetDecoder for Named {
        fn decode(&self, _: ByteStream, _: &str) -> Result<Arc<dyn Asset>, DecodeError> {
            Err(DecodeError::malformed(self.0))
        }
    }

    fn name_of(decoder: &Arc<dyn AssetDecoder>) -> DecodeError {
        decoder
            .decode(Box::new(std::io::empty()), "")
            .err()
            .unwrap()
    }

    #[test]
    fn test_extensions_are_normalized_and_shared() {
        let mut registry = DecoderRegistry::default();
        registry.register(Arc::new(Named("dds")), &[".DDS", "s3tc"]);

        let a = registry.get("dds").unwrap();
        let b = registry.get(".S3TC").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.get("png").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = DecoderRegistry::default();
        registry.register(Arc::new(Named("first")), &["png"]);
        registry.register(Arc::new(Named("second")), &["png"]);
        assert_eq!(
            name_of(&registry.get("png").unwrap()),
            DecodeError::malformed("second")
        );
    }
}
