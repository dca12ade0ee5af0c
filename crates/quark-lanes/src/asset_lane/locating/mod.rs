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

//! Locators resolve a scheme-less resource name to a readable byte stream.

mod filesystem_locator;
mod http_locator;
mod memory_locator;
mod pack_locator;

pub use filesystem_locator::*;
pub use http_locator::*;
pub use memory_locator::*;
pub use pack_locator::*;
