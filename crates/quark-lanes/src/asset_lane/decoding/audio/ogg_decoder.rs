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
use crate::asset_lane::decoding::read_to_vec;
use quark_core::asset::{
    resources::{Audio, AudioFormat},
    Asset, AssetDecoder, ByteStream, DecodeError,
};
use std::{io::Cursor, sync::Arc};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

/// Decodes Ogg Vorbis files into signed 16-bit PCM using `symphonia`.
#[derive(Debug, Clone, Default)]
pub struct OggDecoder;

impl OggDecoder {
    /// Creates a new instance of `OggDecoder`.
    pub fn new() -> Self {
        Self
    }
}

impl AssetDecoder for OggDecoder {
    fn decode(&self, stream: ByteStream, extension: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        let bytes = read_to_vec(stream)?;
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::malformed(format!("unrecognised container: {e}")))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::malformed("no audio track"))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::unsupported(format!("codec: {e}")))?;

        let mut data = Vec::new();
        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                // End of stream.
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::malformed(e.to_string())),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());
                    let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    samples.copy_interleaved_ref(decoded);
                    for sample in samples.samples() {
                        data.extend_from_slice(&sample.to_le_bytes());
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Skipping undecodable Ogg packet: {e}");
                }
                Err(e) => return Err(DecodeError::malformed(e.to_string())),
            }
        }

        let channels = channels.ok_or_else(|| DecodeError::malformed("unknown channel count"))?;
        let rate = sample_rate.ok_or_else(|| DecodeError::malformed("unknown sample rate"))?;
        let format = u16::try_from(channels)
            .ok()
            .and_then(|c| AudioFormat::from_layout(c, 16))
            .ok_or_else(|| DecodeError::unsupported(format!("{channels} channels")))?;

        let frames = (data.len() / 2 / channels) as u64;
        log::trace!("Decoded Ogg: {format:?}, {rate} Hz, {frames} frames.");
        Ok(Arc::new(Audio::new(
            data,
            format,
            duration_ms(frames, rate),
            rate,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: Vec<u8>) -> Result<Arc<dyn Asset>, DecodeError> {
        OggDecoder::new().decode(Box::new(Cursor::new(bytes)), "ogg")
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode(b"definitely not an ogg stream".to_vec()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_other_container_is_malformed() {
        let mut wav = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        wav.extend([0; 32]);
        assert!(matches!(decode(wav), Err(DecodeError::Malformed(_))));
    }
}
