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

use super::duration_ms;
use hound::{SampleFormat, WavReader};
use quark_core::asset::{
    resources::{Audio, AudioFormat},
    Asset, AssetDecoder, ByteStream, DecodeError,
};
use std::sync::Arc;

/// Decodes RIFF/WAVE files.
///
/// 8-bit integer data is kept as unsigned 8-bit PCM; every other sample
/// format (16/24/32-bit integer, float) is converted to signed 16-bit.
#[derive(Debug, Clone, Default)]
pub struct WavDecoder;

impl WavDecoder {
    /// Creates a new instance of `WavDecoder`.
    pub fn new() -> Self {
        Self
    }
}

/// Upper bound on samples reserved up front. The declared length comes from
/// the header and is not trusted; longer files grow the buffer as they read.
const MAX_RESERVED_SAMPLES: usize = 1 << 22;

/// Bytes to reserve for `declared` samples widened to 16 bits.
fn reserved_bytes(declared: u32) -> usize {
    (declared as usize).min(MAX_RESERVED_SAMPLES) * 2
}

fn map_hound_error(e: hound::Error) -> DecodeError {
    match e {
        hound::Error::Unsupported => DecodeError::unsupported("WAVE encoding"),
        hound::Error::TooWide => DecodeError::unsupported("sample width above 32 bits"),
        other => DecodeError::malformed(other.to_string()),
    }
}

impl AssetDecoder for WavDecoder {
    fn decode(&self, stream: ByteStream, _extension: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        let mut reader = WavReader::new(stream).map_err(map_hound_error)?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.channels > 2 {
            return Err(DecodeError::unsupported(format!(
                "{} channels",
                spec.channels
            )));
        }

        let (data, bits) = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 8) => {
                let samples = reader
                    .samples::<i8>()
                    .map(|s| s.map(|s| (i16::from(s) + 128) as u8))
                    .collect::<Result<Vec<u8>, _>>()
                    .map_err(map_hound_error)?;
                (samples, 8)
            }
            (SampleFormat::Int, bits) => {
                let shift = bits.saturating_sub(16);
                let widen = 16u16.saturating_sub(bits);
                let mut data = Vec::with_capacity(reserved_bytes(reader.len()));
                for sample in reader.samples::<i32>() {
                    let sample = sample.map_err(map_hound_error)?;
                    let sample = ((sample >> shift) << widen) as i16;
                    data.extend_from_slice(&sample.to_le_bytes());
                }
                (data, 16)
            }
            (SampleFormat::Float, _) => {
                let mut data = Vec::with_capacity(reserved_bytes(reader.len()));
                for sample in reader.samples::<f32>() {
                    let sample = sample.map_err(map_hound_error)?;
                    let sample = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                    data.extend_from_slice(&sample.to_le_bytes());
                }
                (data, 16)
            }
        };

        let format = AudioFormat::from_layout(spec.channels, bits).ok_or_else(|| {
            DecodeError::unsupported(format!("{} channels at {bits} bits", spec.channels))
        })?;
        let frames = (data.len() / format.bytes_per_sample() / usize::from(spec.channels)) as u64;
        log::trace!(
            "Decoded WAV: {format:?}, {} Hz, {frames} frames.",
            spec.sample_rate
        );
        Ok(Arc::new(Audio::new(
            data,
            format,
            duration_ms(frames, spec.sample_rate),
            spec.sample_rate,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes(channels: u16, bits: u16, frames: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for i in 0..frames * u32::from(channels) {
            match bits {
                8 => writer.write_sample((i % 100) as i8).unwrap(),
                16 => writer.write_sample((i * 7) as i16).unwrap(),
                _ => writer.write_sample((i as i32) << 8).unwrap(),
            }
        }
        writer.finalize().unwrap();
        bytes
    }

    fn decode(bytes: Vec<u8>) -> Result<Arc<dyn Asset>, DecodeError> {
        WavDecoder::new().decode(Box::new(Cursor::new(bytes)), "wav")
    }

    fn audio(asset: &Arc<dyn Asset>) -> &Audio {
        asset.as_any().downcast_ref::<Audio>().unwrap()
    }

    #[test]
    fn test_stereo_16_bit() {
        let asset = decode(wav_bytes(2, 16, 4000)).unwrap();
        let audio = audio(&asset);
        assert_eq!(audio.format(), AudioFormat::Stereo16);
        assert_eq!(audio.rate(), 8000);
        assert_eq!(audio.duration(), 500);
        assert_eq!(asset.host_memory_bytes(), 4000 * 2 * 2);
        assert!(!asset.is_streaming());
    }

    #[test]
    fn test_8_bit_stays_unsigned() {
        let asset = decode(wav_bytes(1, 8, 3)).unwrap();
        let audio = audio(&asset);
        assert_eq!(audio.format(), AudioFormat::Mono8);
        assert_eq!(audio.data().with(|d| d.clone()).unwrap(), [128, 129, 130]);
    }

    #[test]
    fn test_24_bit_is_narrowed_to_16() {
        let asset = decode(wav_bytes(1, 24, 2)).unwrap();
        let audio = audio(&asset);
        assert_eq!(audio.format(), AudioFormat::Mono16);
        // Samples 0 and 1<<8 at 24 bits are 0 and 1 at 16 bits.
        assert_eq!(audio.data().with(|d| d.clone()).unwrap(), [0, 0, 1, 0]);
    }

    #[test]
    fn test_more_than_two_channels_is_unsupported() {
        assert!(matches!(
            decode(wav_bytes(4, 16, 10)),
            Err(DecodeError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_reservation_ignores_forged_lengths() {
        assert_eq!(reserved_bytes(100), 200);
        assert_eq!(reserved_bytes(u32::MAX), MAX_RESERVED_SAMPLES * 2);
    }

    #[test]
    fn test_forged_data_length_is_malformed() {
        let mut bytes = wav_bytes(1, 16, 4);
        let data = bytes
            .windows(4)
            .position(|w| w == b"data")
            .expect("data chunk");
        bytes[data + 4..data + 8].copy_from_slice(&0xffff_fff0u32.to_le_bytes());

        assert!(matches!(decode(bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode(vec![0, 1, 2, 3, 4]),
            Err(DecodeError::Malformed(_))
        ));
    }
}
