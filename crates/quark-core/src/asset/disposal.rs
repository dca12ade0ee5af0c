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

//! Hand-off of evicted resources to the thread that owns the device.

use super::{AssetHandle, DeviceContext};

/// A thread-safe queue of resources whose device-side state must be deleted.
///
/// Evictions can happen on any thread, but device deletion may only run where
/// the device lives. Evicting code pushes handles here; the device owner
/// drains them with [`flush`](DeviceDeletionQueue::flush).
#[derive(Debug)]
pub struct DeviceDeletionQueue {
    sender: flume::Sender<AssetHandle>,
    receiver: flume::Receiver<AssetHandle>,
}

impl DeviceDeletionQueue {
    /// Creates an empty queue backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Schedules the device-side deletion of `handle`.
    ///
    /// Resources without device state are skipped.
    pub fn push(&self, handle: AssetHandle) {
        if !handle.has_device_state() {
            return;
        }
        log::trace!("Queueing device deletion for '{}'.", handle.key());
        if let Err(e) = self.sender.send(handle) {
            log::error!("Failed to queue device deletion: {e}. Receiver likely disconnected.");
        }
    }

    /// Number of resources waiting for deletion.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether nothing is waiting for deletion.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Deletes the device-side state of every queued resource.
    ///
    /// Must be called from the execution context that owns `context`.
    /// Returns how many device objects were actually deleted.
    pub fn flush(&self, context: &mut dyn DeviceContext) -> usize {
        let mut deleted = 0;
        for handle in self.receiver.try_iter() {
            if let Some(state) = handle.device_state() {
                if state.delete(handle.kind(), context) {
                    deleted += 1;
                }
            }
        }
        deleted
    }
}

impl Default for DeviceDeletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{
        resources::{Audio, AudioFormat},
        AssetKey, AssetKind, DeviceHandle,
    };
    use std::{sync::Arc, thread};

    #[derive(Default)]
    struct CountingDevice {
        deleted: Vec<DeviceHandle>,
    }

    impl DeviceContext for CountingDevice {
        fn delete(&mut self, _kind: AssetKind, handle: DeviceHandle) {
            self.deleted.push(handle);
        }
    }

    fn realized_audio(id: u64) -> AssetHandle {
        let audio = Audio::new(vec![0; 4], AudioFormat::Mono16, 1, 44100);
        audio
            .device()
            .get_or_create(|| Ok::<_, ()>(DeviceHandle(id)))
            .unwrap();
        AssetHandle::new(AssetKey::new("INTERNAL", "a.wav"), Arc::new(audio))
    }

    #[test]
    fn test_flush_deletes_on_owner_thread() {
        let queue = Arc::new(DeviceDeletionQueue::new());
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            producer.push(realized_audio(1));
            producer.push(realized_audio(2));
        });
        handle.join().expect("Thread join failed");

        assert_eq!(queue.len(), 2);
        let mut device = CountingDevice::default();
        assert_eq!(queue.flush(&mut device), 2);
        assert_eq!(device.deleted, vec![DeviceHandle(1), DeviceHandle(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unrealized_resources_delete_nothing() {
        let queue = DeviceDeletionQueue::new();
        let audio = Audio::new(vec![0; 4], AudioFormat::Mono16, 1, 44100);
        queue.push(AssetHandle::new(
            AssetKey::new("INTERNAL", "b.wav"),
            Arc::new(audio),
        ));
        let mut device = CountingDevice::default();
        assert_eq!(queue.flush(&mut device), 0);
        assert!(device.deleted.is_empty());
    }
}
