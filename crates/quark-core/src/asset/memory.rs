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

//! The two memory classes of a decoded resource.
//!
//! [`HostMemory`] holds staging bytes produced by a decoder. [`DeviceState`]
//! holds the opaque handle the device layer creates when the resource is first
//! used. They are released independently and in any order.

use super::AssetKind;
use std::sync::{Mutex, PoisonError, RwLock};

/// Host-side staging data that can be freed while the resource stays alive.
#[derive(Debug)]
pub struct HostMemory<T> {
    data: RwLock<Option<T>>,
}

impl<T> HostMemory<T> {
    /// Wraps freshly decoded data.
    pub fn new(data: T) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Runs `f` against the data, or returns `None` once it has been released.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f)
    }

    /// Frees the data. Returns `true` only for the call that actually freed it.
    pub fn release(&self) -> bool {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.take().is_some()
    }

    /// Whether the data has been freed.
    pub fn is_released(&self) -> bool {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// An opaque handle to a device-side object (a GPU texture, an audio buffer...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// The execution context that owns the graphics/audio device.
///
/// Only the device owner holds a `&mut` to its context, so requiring one is
/// what keeps device deletion off I/O-completion threads. Implementations are
/// not required to be `Send`.
pub trait DeviceContext {
    /// Destroys the device-side object behind `handle`.
    fn delete(&mut self, kind: AssetKind, handle: DeviceHandle);
}

/// The lazily created device-side slot of a resource.
#[derive(Debug, Default)]
pub struct DeviceState {
    handle: Mutex<Option<DeviceHandle>>,
}

impl DeviceState {
    /// Creates an empty slot; nothing exists on the device yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current handle, creating it with `create` on first use.
    ///
    /// Called by the device layer when it first realizes the resource.
    pub fn get_or_create<E>(
        &self,
        create: impl FnOnce() -> Result<DeviceHandle, E>,
    ) -> Result<DeviceHandle, E> {
        let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = *guard {
            return Ok(handle);
        }
        let handle = create()?;
        *guard = Some(handle);
        Ok(handle)
    }

    /// The device handle, if one has been created.
    pub fn handle(&self) -> Option<DeviceHandle> {
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deletes the device-side object through its owning context.
    ///
    /// Returns `true` if something was deleted; calling it again is a no-op.
    pub fn delete(&self, kind: AssetKind, context: &mut dyn DeviceContext) -> bool {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                context.delete(kind, handle);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingDevice {
        deleted: Vec<(AssetKind, DeviceHandle)>,
    }

    impl DeviceContext for RecordingDevice {
        fn delete(&mut self, kind: AssetKind, handle: DeviceHandle) {
            self.deleted.push((kind, handle));
        }
    }

    #[test]
    fn test_host_memory_release_is_idempotent() {
        let memory = HostMemory::new(vec![1u8, 2, 3]);
        assert_eq!(memory.with(|v| v.len()), Some(3));
        assert!(memory.release());
        assert!(!memory.release());
        assert!(memory.is_released());
        assert_eq!(memory.with(|v| v.len()), None);
    }

    #[test]
    fn test_device_state_is_created_once() {
        let state = DeviceState::new();
        let mut calls = 0;
        for _ in 0..3 {
            let handle = state
                .get_or_create(|| {
                    calls += 1;
                    Ok::<_, ()>(DeviceHandle(7))
                })
                .unwrap();
            assert_eq!(handle, DeviceHandle(7));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_device_delete_is_idempotent() {
        let state = DeviceState::new();
        let mut device = RecordingDevice::default();
        assert!(!state.delete(AssetKind::Texture, &mut device));

        state.get_or_create(|| Ok::<_, ()>(DeviceHandle(3))).unwrap();
        assert!(state.delete(AssetKind::Texture, &mut device));
        assert!(!state.delete(AssetKind::Texture, &mut device));
        assert_eq!(device.deleted, vec![(AssetKind::Texture, DeviceHandle(3))]);
        assert_eq!(state.handle(), None);
    }

    #[test]
    fn test_host_and_device_release_are_independent() {
        let memory = HostMemory::new(vec![0u8; 16]);
        let state = DeviceState::new();
        state.get_or_create(|| Ok::<_, ()>(DeviceHandle(1))).unwrap();

        memory.release();
        assert_eq!(state.handle(), Some(DeviceHandle(1)));

        let mut device = RecordingDevice::default();
        state.delete(AssetKind::Audio, &mut device);
        assert!(memory.is_released());
    }
}
