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

//! The asset agent: the public-facing API for requesting resources and
//! querying their state.
//!
//! It resolves identifiers against the registered locators and decoders,
//! coordinates concurrent requests through the shared
//! [`AssetCache`](quark_data::assets::AssetCache), and hands evicted
//! resources to the device owner for deletion.

mod config;
mod manager;
mod pending;
mod registry;

pub use config::*;
pub use manager::*;
pub use pending::*;
