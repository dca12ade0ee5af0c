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

//! Concrete resource types produced by the built-in decoders.
//!
//! Each type keeps its decoded payload in a [`HostMemory`](super::HostMemory)
//! cell and its device object in a [`DeviceState`](super::DeviceState). The
//! few properties that may change after publication (sampler state, shader
//! uniform values) live in small cells with their own dirty flag so readers
//! never need the cache's lock.

mod audio;
mod shader;
mod texture;

pub use audio::*;
pub use shader::*;
pub use texture::*;
