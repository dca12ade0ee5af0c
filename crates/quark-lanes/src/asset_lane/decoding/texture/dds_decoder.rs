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
use quark_core::asset::{
    resources::{Texture, TextureFormat},
    Asset, AssetDecoder, ByteStream, DecodeError, DeviceCapabilities,
};
use std::sync::Arc;

const MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;
/// Magic plus header.
const DATA_OFFSET: usize = 128;

const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;

/// The fields of a DDS header this decoder cares about.
#[derive(Debug, Clone, Copy)]
struct DdsHeader {
    width: u32,
    height: u32,
    mip_levels: u32,
    pf_flags: u32,
    four_cc: [u8; 4],
    bit_count: u32,
    masks: [u32; 4],
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

impl DdsHeader {
    fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < DATA_OFFSET || !bytes.starts_with(MAGIC) {
            return Err(DecodeError::malformed("missing DDS magic or header"));
        }
        if u32_at(bytes, 4) != HEADER_SIZE || u32_at(bytes, 76) != PIXEL_FORMAT_SIZE {
            return Err(DecodeError::malformed("unexpected DDS header size"));
        }

        let flags = u32_at(bytes, 8);
        let mip_levels = if flags & DDSD_MIPMAPCOUNT != 0 {
            u32_at(bytes, 28).max(1)
        } else {
            1
        };
        let mut four_cc = [0; 4];
        four_cc.copy_from_slice(&bytes[84..88]);

        Ok(Self {
            height: u32_at(bytes, 12),
            width: u32_at(bytes, 16),
            mip_levels,
            pf_flags: u32_at(bytes, 80),
            four_cc,
            bit_count: u32_at(bytes, 88),
            masks: [
                u32_at(bytes, 92),
                u32_at(bytes, 96),
                u32_at(bytes, 100),
                u32_at(bytes, 104),
            ],
        })
    }
}

/// How the payload maps onto a texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Compressed(TextureFormat),
    Rgba,
    Bgra,
}

/// Decodes DirectDraw Surface textures.
///
/// DXT1/DXT3/DXT5 payloads are kept block-compressed, which requires the
/// device to support S3TC. Uncompressed 32-bit payloads are converted to
/// RGBA8. Every mip level present in the file is kept.
#[derive(Debug, Clone)]
pub struct DdsDecoder {
    s3tc: bool,
    max_texture_size: u32,
}

impl DdsDecoder {
    /// Creates a decoder for a device with the given capabilities.
    pub fn new(capabilities: &DeviceCapabilities) -> Self {
        Self {
            s3tc: capabilities.s3tc,
            max_texture_size: capabilities.max_texture_size,
        }
    }

    fn layout(&self, header: &DdsHeader) -> Result<Layout, DecodeError> {
        if header.pf_flags & DDPF_FOURCC != 0 {
            let format = match &header.four_cc {
                b"DXT1" => TextureFormat::Dxt1,
                b"DXT3" => TextureFormat::Dxt3,
                b"DXT5" => TextureFormat::Dxt5,
                b"DX10" => return Err(DecodeError::unsupported("DX10 extended header")),
                other => {
                    return Err(DecodeError::unsupported(format!(
                        "FourCC '{}'",
                        String::from_utf8_lossy(other)
                    )))
                }
            };
            if !self.s3tc {
                return Err(DecodeError::unsupported(
                    "S3TC compressed textures are not supported by the device",
                ));
            }
            return Ok(Layout::Compressed(format));
        }

        if header.pf_flags & DDPF_RGB != 0 && header.bit_count == 32 {
            match (header.masks[0], header.masks[1], header.masks[2]) {
                (0x0000_00ff, 0x0000_ff00, 0x00ff_0000) => return Ok(Layout::Rgba),
                (0x00ff_0000, 0x0000_ff00, 0x0000_00ff) => return Ok(Layout::Bgra),
                _ => {}
            }
        }
        Err(DecodeError::unsupported(format!(
            "uncompressed {}-bit layout with masks {:08x?}",
            header.bit_count, header.masks
        )))
    }
}

impl AssetDecoder for DdsDecoder {
    fn decode(&self, stream: ByteStream, _extension: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        let bytes = read_to_vec(stream)?;
        let header = DdsHeader::parse(&bytes)?;
        if header.width == 0 || header.height == 0 {
            return Err(DecodeError::malformed("zero-sized DDS surface"));
        }
        if header.width > self.max_texture_size || header.height > self.max_texture_size {
            return Err(DecodeError::unsupported(format!(
                "{}x{} exceeds the maximum texture size of {}",
                header.width, header.height, self.max_texture_size
            )));
        }

        let layout = self.layout(&header)?;
        let format = match layout {
            Layout::Compressed(format) => format,
            Layout::Rgba | Layout::Bgra => TextureFormat::Rgba8Unorm,
        };
        // A full chain never has more levels than the largest dimension allows.
        let max_levels = 32 - header.width.max(header.height).leading_zeros();
        let mip_levels = header.mip_levels.min(max_levels);
        let expected: usize = (0..mip_levels)
            .map(|level| format.level_size(header.width >> level, header.height >> level))
            .sum();

        let payload = &bytes[DATA_OFFSET..];
        if payload.len() < expected {
            return Err(DecodeError::malformed(format!(
                "truncated payload: expected {expected} bytes, found {}",
                payload.len()
            )));
        }
        let mut pixels = payload[..expected].to_vec();
        if layout == Layout::Bgra {
            for texel in pixels.chunks_exact_mut(4) {
                texel.swap(0, 2);
            }
        }

        log::trace!(
            "Decoded {}x{} DDS ({format:?}, {mip_levels} levels).",
            header.width,
            header.height
        );
        Ok(Arc::new(Texture::new(
            format,
            header.width,
            header.height,
            mip_levels,
            pixels,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(width: u32, height: u32, mips: u32, pf_flags: u32, four_cc: &[u8; 4]) -> Vec<u8> {
        let mut bytes = vec![0u8; DATA_OFFSET];
        bytes[..4].copy_from_slice(MAGIC);
        let mut put = |offset: usize, value: u32| {
            bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };
        put(4, HEADER_SIZE);
        put(8, 0x1007 | if mips > 1 { DDSD_MIPMAPCOUNT } else { 0 });
        put(12, height);
        put(16, width);
        put(28, mips);
        put(76, PIXEL_FORMAT_SIZE);
        put(80, pf_flags);
        bytes[84..88].copy_from_slice(four_cc);
        bytes
    }

    fn bgra_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = header(width, height, 1, DDPF_RGB | 0x1, &[0; 4]);
        for (offset, value) in [
            (88, 32),
            (92, 0x00ff_0000),
            (96, 0x0000_ff00),
            (100, 0x0000_00ff),
            (104, 0xff00_0000),
        ] {
            bytes[offset..offset + 4].copy_from_slice(&u32::to_le_bytes(value));
        }
        bytes
    }

    fn decode(decoder: &DdsDecoder, bytes: Vec<u8>) -> Result<Arc<dyn Asset>, DecodeError> {
        decoder.decode(Box::new(Cursor::new(bytes)), "dds")
    }

    fn texture(asset: &Arc<dyn Asset>) -> &Texture {
        asset.as_any().downcast_ref::<Texture>().unwrap()
    }

    #[test]
    fn test_dxt1_with_mip_chain() {
        let decoder = DdsDecoder::new(&DeviceCapabilities::default());
        // 8x8 DXT1: 4 blocks + 1 block + 1 block, 8 bytes each.
        let mut bytes = header(8, 8, 3, DDPF_FOURCC, b"DXT1");
        bytes.extend(vec![0xaa; 6 * 8]);

        let asset = decode(&decoder, bytes).unwrap();
        let texture = texture(&asset);
        assert_eq!(texture.format(), TextureFormat::Dxt1);
        assert_eq!(texture.mip_levels(), 3);
        assert_eq!(asset.host_memory_bytes(), 48);
    }

    #[test]
    fn test_bgra_is_swizzled_to_rgba() {
        let decoder = DdsDecoder::new(&DeviceCapabilities::default());
        let mut bytes = bgra_header(1, 1);
        bytes.extend([10, 20, 30, 40]);

        let asset = decode(&decoder, bytes).unwrap();
        let texture = texture(&asset);
        assert_eq!(texture.format(), TextureFormat::Rgba8Unorm);
        assert_eq!(
            texture.pixels().with(|p| p.clone()).unwrap(),
            [30, 20, 10, 40]
        );
    }

    #[test]
    fn test_s3tc_requires_capability() {
        let decoder = DdsDecoder::new(&DeviceCapabilities {
            s3tc: false,
            ..Default::default()
        });
        let mut bytes = header(4, 4, 1, DDPF_FOURCC, b"DXT5");
        bytes.extend([0; 16]);
        assert!(matches!(
            decode(&decoder, bytes),
            Err(DecodeError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_dx10_is_unsupported() {
        let decoder = DdsDecoder::new(&DeviceCapabilities::default());
        let bytes = header(4, 4, 1, DDPF_FOURCC, b"DX10");
        assert_eq!(
            decode(&decoder, bytes).err(),
            Some(DecodeError::unsupported("DX10 extended header"))
        );
    }

    #[test]
    fn test_bad_magic_and_truncation_are_malformed() {
        let decoder = DdsDecoder::new(&DeviceCapabilities::default());
        assert!(matches!(
            decode(&decoder, b"PNG not a dds".to_vec()),
            Err(DecodeError::Malformed(_))
        ));

        let mut truncated = header(8, 8, 1, DDPF_FOURCC, b"DXT3");
        truncated.extend([0; 10]);
        assert!(matches!(
            decode(&decoder, truncated),
            Err(DecodeError::Malformed(_))
        ));
    }
}
