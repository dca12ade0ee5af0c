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

//! Decoders turning located byte streams into resources.

pub mod audio;
mod shader_decoder;
pub mod texture;

pub use audio::{OggDecoder, WavDecoder};
pub use shader_decoder::*;
pub use texture::{DdsDecoder, PngDecoder};

use quark_core::asset::{AssetDecoder, ByteStream, DecodeError, DeviceCapabilities};
use std::{io::Read, sync::Arc};

/// A decoder together with the extensions it is registered under.
pub type DecoderBinding = (Arc<dyn AssetDecoder>, &'static [&'static str]);

/// The built-in decoder set for a device with the given capabilities.
pub fn default_decoders(capabilities: &DeviceCapabilities) -> Vec<DecoderBinding> {
    vec![
        bind(PngDecoder::new(capabilities), &["png"]),
        bind(DdsDecoder::new(capabilities), &["dds", "s3tc"]),
        bind(GlslPipelineDecoder::new(capabilities), &["pipeline", "glsl"]),
        bind(WavDecoder::new(), &["wav", "wave"]),
        bind(OggDecoder::new(), &["ogg"]),
    ]
}

fn bind(
    decoder: impl AssetDecoder + 'static,
    extensions: &'static [&'static str],
) -> DecoderBinding {
    (Arc::new(decoder), extensions)
}

/// Drains a stream into memory.
pub(crate) fn read_to_vec(mut stream: ByteStream) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}
