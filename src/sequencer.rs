// Copyright 2021 Datafuse Labs
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

//! Per-partition exclusion for the read-diff-write cycle of a base mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use futures::lock::Mutex as AsyncMutex;
use futures::lock::OwnedMutexGuard;

use crate::Value;

/// Serializes mutations of the same partition; different partitions proceed in parallel.
#[derive(Default)]
pub struct PartitionSequencer {
    slots: Mutex<HashMap<Value, Arc<AsyncMutex<()>>>>,
}

/// Held while a mutation of one partition is in flight.
pub struct PartitionGuard {
    _guard: OwnedMutexGuard<()>,
}

impl PartitionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other mutation of `partition` is in flight.
    pub async fn acquire(&self, partition: &Value) -> PartitionGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(partition.clone()).or_default().clone()
        };

        PartitionGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Drop the slots no mutation holds or waits for.
    pub fn prune_idle(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    /// Number of partitions with a slot.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
