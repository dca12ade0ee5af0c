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

use crate::asset_lane::decoding::read_to_vec;
use image::{
    codecs::png::PngDecoder as PngReader, DynamicImage, ImageDecoder, ImageError,
};
use quark_core::asset::{
    resources::{Texture, TextureFormat},
    Asset, AssetDecoder, ByteStream, DecodeError, DeviceCapabilities,
};
use std::{io::Cursor, sync::Arc};

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Decodes PNG images into RGBA8 textures (sRGB, single mip level).
#[derive(Debug, Clone)]
pub struct PngDecoder {
    max_texture_size: u32,
}

impl PngDecoder {
    /// Creates a decoder rejecting images larger than the device supports.
    pub fn new(capabilities: &DeviceCapabilities) -> Self {
        Self {
            max_texture_size: capabilities.max_texture_size,
        }
    }
}

fn map_image_error(e: ImageError) -> DecodeError {
    match e {
        ImageError::Unsupported(e) => DecodeError::unsupported(e.to_string()),
        other => DecodeError::malformed(other.to_string()),
    }
}

impl AssetDecoder for PngDecoder {
    fn decode(&self, stream: ByteStream, _extension: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        let bytes = read_to_vec(stream)?;
        if !bytes.starts_with(PNG_SIGNATURE) {
            return Err(DecodeError::malformed("missing PNG signature"));
        }

        let reader = PngReader::new(Cursor::new(bytes)).map_err(map_image_error)?;
        let (width, height) = reader.dimensions();
        if width > self.max_texture_size || height > self.max_texture_size {
            return Err(DecodeError::unsupported(format!(
                "{width}x{height} exceeds the maximum texture size of {}",
                self.max_texture_size
            )));
        }

        let rgba = DynamicImage::from_decoder(reader)
            .map_err(map_image_error)?
            .to_rgba8();
        log::trace!("Decoded {width}x{height} PNG.");
        Ok(Arc::new(Texture::new(
            TextureFormat::Rgba8UnormSrgb,
            width,
            height,
            1,
            rgba.into_raw(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn decode(decoder: &PngDecoder, bytes: Vec<u8>) -> Result<Arc<dyn Asset>, DecodeError> {
        decoder.decode(Box::new(Cursor::new(bytes)), "png")
    }

    #[test]
    fn test_decodes_rgba_texture() {
        let decoder = PngDecoder::new(&DeviceCapabilities::default());
        let asset = decode(&decoder, png_bytes(4, 2)).unwrap();
        let texture = asset.as_any().downcast_ref::<Texture>().unwrap();

        assert_eq!((texture.width(), texture.height()), (4, 2));
        assert_eq!(texture.format(), TextureFormat::Rgba8UnormSrgb);
        assert_eq!(asset.host_memory_bytes(), 4 * 2 * 4);
        assert_eq!(
            texture.pixels().with(|p| p[..4].to_vec()).unwrap(),
            [255, 0, 0, 255]
        );
    }

    #[test]
    fn test_bad_signature_is_malformed() {
        let decoder = PngDecoder::new(&DeviceCapabilities::default());
        assert!(matches!(
            decode(&decoder, b"GIF89a....".to_vec()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_oversized_image_is_unsupported() {
        let decoder = PngDecoder::new(&DeviceCapabilities {
            max_texture_size: 2,
            ..Default::default()
        });
        assert!(matches!(
            decode(&decoder, png_bytes(4, 2)),
            Err(DecodeError::UnsupportedFeature(_))
        ));
    }
}
