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

use serde::{Deserialize, Serialize};

/// What the target device can realize, captured by decoders at registration.
///
/// Decoders use these flags to decide which representation to emit, or to
/// reject a container variant the device could never use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCapabilities {
    /// S3TC (DXT1/3/5) block-compressed textures.
    pub s3tc: bool,
    /// Programmable geometry stage.
    pub geometry_shaders: bool,
    /// Largest texture dimension, in texels.
    pub max_texture_size: u32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            s3tc: true,
            geometry_shaders: false,
            max_texture_size: 8192,
        }
    }
}
