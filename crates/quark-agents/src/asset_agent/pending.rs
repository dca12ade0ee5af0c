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

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use quark_core::asset::{AssetError, AssetHandle, AssetKey};
use quark_data::assets::Waiter;
use std::time::Duration;

/// The eventual outcome of [`AssetManager::request`](super::AssetManager::request).
///
/// The outcome is delivered exactly once; after it has been taken, further
/// polls return `None`.
#[derive(Debug)]
pub struct PendingLoad {
    key: AssetKey,
    receiver: Receiver<Result<AssetHandle, AssetError>>,
    taken: bool,
}

impl PendingLoad {
    /// Creates a pending load and the waiter that completes it.
    pub(crate) fn channel(key: AssetKey) -> (Self, Waiter) {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let waiter: Waiter = Box::new(move |outcome| {
            let _ = sender.send(outcome);
        });
        (
            Self {
                key,
                receiver,
                taken: false,
            },
            waiter,
        )
    }

    /// The cache key this load resolves.
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// A waiter dropped without firing only happens when the manager's
    /// runtime shut down underneath it.
    fn abandoned(&self) -> Result<AssetHandle, AssetError> {
        Err(AssetError::Cancelled {
            key: self.key.clone(),
        })
    }

    /// Blocks until the outcome is available.
    pub fn wait(self) -> Result<AssetHandle, AssetError> {
        self.receiver.recv().unwrap_or_else(|_| self.abandoned())
    }

    /// Blocks for at most `timeout`. Returns `None` if the load is still in
    /// flight or the outcome was already taken.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<AssetHandle, AssetError>> {
        if self.taken {
            return None;
        }
        let outcome = match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => self.abandoned(),
        };
        self.taken = true;
        Some(outcome)
    }

    /// Returns the outcome if it is already available.
    pub fn try_take(&mut self) -> Option<Result<AssetHandle, AssetError>> {
        if self.taken {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => self.abandoned(),
        };
        self.taken = true;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_taken_once() {
        let key = AssetKey::new("INTERNAL", "a.png");
        let (mut pending, waiter) = PendingLoad::channel(key.clone());
        assert!(pending.try_take().is_none());

        waiter(Err(AssetError::UnknownExtension("png".into())));
        assert_eq!(
            pending.try_take(),
            Some(Err(AssetError::UnknownExtension("png".into())))
        );
        assert!(pending.try_take().is_none());
        assert!(pending.wait_timeout(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn test_dropped_waiter_reports_cancellation() {
        let key = AssetKey::new("INTERNAL", "a.png");
        let (pending, waiter) = PendingLoad::channel(key.clone());
        drop(waiter);
        assert_eq!(pending.wait(), Err(AssetError::Cancelled { key }));
    }
}
