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

//! Defines the texture resource and its sampler state.

use crate::asset::{Asset, AssetKind, DeviceState, HostMemory};
use std::{
    any::Any,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};

/// The pixel layout of a texture's staging data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// S3TC DXT1 blocks (8 bytes per 4x4 block).
    Dxt1,
    /// S3TC DXT3 blocks (16 bytes per 4x4 block).
    Dxt3,
    /// S3TC DXT5 blocks (16 bytes per 4x4 block).
    Dxt5,
}

impl TextureFormat {
    /// Whether the format stores block-compressed data.
    pub fn is_compressed(&self) -> bool {
        self.block_size().is_some()
    }

    /// Bytes per 4x4 block for compressed formats.
    pub fn block_size(&self) -> Option<usize> {
        match self {
            TextureFormat::Dxt1 => Some(8),
            TextureFormat::Dxt3 | TextureFormat::Dxt5 => Some(16),
            _ => None,
        }
    }

    /// Bytes per pixel for uncompressed formats.
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            TextureFormat::R8Unorm => Some(1),
            TextureFormat::Rg8Unorm => Some(2),
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => Some(4),
            _ => None,
        }
    }

    /// Size in bytes of one mip level of `width` x `height` texels.
    pub fn level_size(&self, width: u32, height: u32) -> usize {
        let (width, height) = (width.max(1) as usize, height.max(1) as usize);
        match (self.block_size(), self.bytes_per_pixel()) {
            (Some(block), _) => width.div_ceil(4) * height.div_ceil(4) * block,
            (None, Some(bpp)) => width * height * bpp,
            (None, None) => 0,
        }
    }
}

/// How texels are filtered when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation within one level.
    #[default]
    Linear,
    /// Linear interpolation within and between mip levels.
    Trilinear,
}

/// How coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureBorder {
    /// Tile the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    Clamp,
    /// Tile, mirroring every other repetition.
    MirrorRepeat,
}

/// The sampling parameters of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerState {
    /// Filter mode.
    pub filter: TextureFilter,
    /// Border mode along the x coordinate.
    pub border_x: TextureBorder,
    /// Border mode along the y coordinate.
    pub border_y: TextureBorder,
}

/// The mutable sampler state of a published texture.
///
/// Setters only raise the dirty flag when the value actually changes; the
/// device layer clears it with [`take_dirty`](SamplerCell::take_dirty) when it
/// pushes the new state to the device.
#[derive(Debug, Default)]
pub struct SamplerCell {
    state: Mutex<SamplerState>,
    dirty: AtomicBool,
}

impl SamplerCell {
    /// Current sampler parameters.
    pub fn state(&self) -> SamplerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the filter mode.
    pub fn set_filter(&self, filter: TextureFilter) {
        self.update(|state| state.filter = filter);
    }

    /// Changes the border mode for the x and y coordinates.
    pub fn set_clamp(&self, border_x: TextureBorder, border_y: TextureBorder) {
        self.update(|state| {
            state.border_x = border_x;
            state.border_y = border_y;
        });
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn update(&self, f: impl FnOnce(&mut SamplerState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = *state;
        f(&mut state);
        if *state != before {
            self.dirty.store(true, Ordering::Release);
        }
    }
}

/// A decoded two-dimensional texture.
#[derive(Debug)]
pub struct Texture {
    format: TextureFormat,
    width: u32,
    height: u32,
    mip_levels: u32,
    pixels: HostMemory<Vec<u8>>,
    device: DeviceState,
    sampler: SamplerCell,
}

impl Texture {
    /// Creates a texture from decoded staging data, all mip levels packed back to back.
    pub fn new(
        format: TextureFormat,
        width: u32,
        height: u32,
        mip_levels: u32,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            format,
            width,
            height,
            mip_levels: mip_levels.max(1),
            pixels: HostMemory::new(pixels),
            device: DeviceState::new(),
            sampler: SamplerCell::default(),
        }
    }

    /// The pixel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Width of the base level, in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the base level, in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of mip levels in the staging data.
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// The staging pixels.
    pub fn pixels(&self) -> &HostMemory<Vec<u8>> {
        &self.pixels
    }

    /// The device-side slot.
    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    /// The mutable sampler parameters.
    pub fn sampler(&self) -> &SamplerCell {
        &self.sampler
    }
}

impl Asset for Texture {
    fn kind(&self) -> AssetKind {
        AssetKind::Texture
    }

    fn device_state(&self) -> Option<&DeviceState> {
        Some(&self.device)
    }

    fn release_host_memory(&self) {
        self.pixels.release();
    }

    fn host_memory_bytes(&self) -> usize {
        self.pixels.with(Vec::len).unwrap_or(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_size() {
        assert_eq!(TextureFormat::Rgba8Unorm.level_size(4, 2), 32);
        assert_eq!(TextureFormat::Dxt1.level_size(4, 4), 8);
        assert_eq!(TextureFormat::Dxt5.level_size(5, 5), 64);
        assert_eq!(TextureFormat::Dxt1.level_size(1, 1), 8);
    }

    #[test]
    fn test_sampler_dirty_only_on_change() {
        let texture = Texture::new(TextureFormat::Rgba8Unorm, 1, 1, 1, vec![0; 4]);
        let sampler = texture.sampler();
        assert!(!sampler.take_dirty());

        sampler.set_clamp(TextureBorder::Repeat, TextureBorder::Repeat);
        assert!(!sampler.take_dirty());

        sampler.set_clamp(TextureBorder::Clamp, TextureBorder::Repeat);
        assert!(sampler.take_dirty());
        assert!(!sampler.take_dirty());
        assert_eq!(sampler.state().border_x, TextureBorder::Clamp);
    }

    #[test]
    fn test_release_keeps_metadata() {
        let texture = Texture::new(TextureFormat::Rgba8Unorm, 2, 2, 1, vec![0; 16]);
        assert_eq!(texture.host_memory_bytes(), 16);
        texture.release_host_memory();
        texture.release_host_memory();
        assert_eq!(texture.host_memory_bytes(), 0);
        assert_eq!(texture.width(), 2);
    }
}
