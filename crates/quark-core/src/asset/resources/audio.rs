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

//! Defines the audio resource.

use crate::asset::{Asset, AssetKind, DeviceState, HostMemory};
use std::any::Any;

/// The sample layout of an audio resource's PCM data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    /// One channel of unsigned 8-bit samples.
    Mono8,
    /// One channel of signed 16-bit little-endian samples.
    Mono16,
    /// Two interleaved channels of unsigned 8-bit samples.
    Stereo8,
    /// Two interleaved channels of signed 16-bit little-endian samples.
    Stereo16,
}

impl AudioFormat {
    /// Picks the format for a channel count and sample width.
    pub fn from_layout(channels: u16, bits: u16) -> Option<Self> {
        match (channels, bits) {
            (1, 8) => Some(AudioFormat::Mono8),
            (1, 16) => Some(AudioFormat::Mono16),
            (2, 8) => Some(AudioFormat::Stereo8),
            (2, 16) => Some(AudioFormat::Stereo16),
            _ => None,
        }
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        match self {
            AudioFormat::Mono8 | AudioFormat::Mono16 => 1,
            AudioFormat::Stereo8 | AudioFormat::Stereo16 => 2,
        }
    }

    /// Bytes per sample of one channel.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            AudioFormat::Mono8 | AudioFormat::Stereo8 => 1,
            AudioFormat::Mono16 | AudioFormat::Stereo16 => 2,
        }
    }
}

/// A sound decoded at once into a single PCM buffer.
///
/// The decoded bytes are held as staging data until the audio device has
/// uploaded them, after which they can be released while the device buffer
/// stays alive.
#[derive(Debug)]
pub struct Audio {
    format: AudioFormat,
    duration: u32,
    rate: u32,
    data: HostMemory<Vec<u8>>,
    device: DeviceState,
}

impl Audio {
    /// Creates an audio resource.
    ///
    /// `duration` is in milliseconds and `rate` in samples per second.
    pub fn new(data: Vec<u8>, format: AudioFormat, duration: u32, rate: u32) -> Self {
        Self {
            format,
            duration,
            rate,
            data: HostMemory::new(data),
            device: DeviceState::new(),
        }
    }

    /// The sample layout.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Duration in milliseconds.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Sample rate in Hz.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// The staging PCM bytes.
    pub fn data(&self) -> &HostMemory<Vec<u8>> {
        &self.data
    }

    /// The device-side slot.
    pub fn device(&self) -> &DeviceState {
        &self.device
    }
}

impl Asset for Audio {
    fn kind(&self) -> AssetKind {
        AssetKind::Audio
    }

    fn is_streaming(&self) -> bool {
        false
    }

    fn device_state(&self) -> Option<&DeviceState> {
        Some(&self.device)
    }

    fn release_host_memory(&self) {
        self.data.release();
    }

    fn host_memory_bytes(&self) -> usize {
        self.data.with(Vec::len).unwrap_or(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_layout() {
        assert_eq!(AudioFormat::from_layout(2, 16), Some(AudioFormat::Stereo16));
        assert_eq!(AudioFormat::from_layout(6, 16), None);
        assert_eq!(AudioFormat::Stereo8.channels(), 2);
        assert_eq!(AudioFormat::Mono16.bytes_per_sample(), 2);
    }
}
