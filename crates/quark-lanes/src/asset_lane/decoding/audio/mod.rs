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

//! Audio decoders. Both produce interleaved PCM staging buffers.

mod ogg_decoder;
mod wav_decoder;

pub use ogg_decoder::*;
pub use wav_decoder::*;

/// Playback length of `frames` sample frames at `rate` Hz, in milliseconds.
pub(crate) fn duration_ms(frames: u64, rate: u32) -> u32 {
    if rate == 0 {
        return 0;
    }
    (frames * 1000 / u64::from(rate)).min(u64::from(u32::MAX)) as u32
}
