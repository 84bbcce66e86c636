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

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::Timestamp;

/// A row tombstone: everything in the row written at or before `marked_at` is deleted.
///
/// Deletions order by `marked_at`, so merging two of them is `Ord::max`,
/// and `Option<Deletion>` merges with `Option::max` as well.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deletion {
    pub marked_at: Timestamp,
}

impl Deletion {
    pub fn new(marked_at: Timestamp) -> Self {
        Self { marked_at }
    }

    /// Whether data written at `timestamp` is shadowed by this deletion.
    pub fn deletes(&self, timestamp: Timestamp) -> bool {
        timestamp <= self.marked_at
    }
}

impl fmt::Display for Deletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deleted@{}", self.marked_at)
    }
}
