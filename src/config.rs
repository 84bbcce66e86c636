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

use serde::Deserialize;
use serde::Serialize;

/// Settings of a [`ViewUpdateEngine`](crate::engine::ViewUpdateEngine).
///
/// Missing fields take their default value when deserialized.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// A range or partition deletion that scans more rows than this logs a warning.
    pub range_scan_warn_threshold: usize,

    /// Drop the lock slot of a partition once no mutation of it is in flight.
    pub prune_idle_partitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            range_scan_warn_threshold: 1000,
            prune_idle_partitions: true,
        }
    }
}
