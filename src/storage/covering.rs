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

use std::ops::RangeBounds;

use crate::cell::Deletion;
use crate::row::ClusteringRange;
use crate::Value;

/// Deletions of one partition that cover more than a single row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoveringDeletions {
    partition: Option<Deletion>,
    ranges: Vec<(ClusteringRange, Deletion)>,
}

impl CoveringDeletions {
    pub fn new(partition: Option<Deletion>, ranges: Vec<(ClusteringRange, Deletion)>) -> Self {
        Self { partition, ranges }
    }

    /// Add the deletions of another level.
    pub fn extend(&mut self, other: CoveringDeletions) {
        self.partition = self.partition.max(other.partition);
        self.ranges.extend(other.ranges);
    }

    /// The greatest deletion covering the row with clustering key `clustering`.
    pub fn for_clustering(&self, clustering: &Value) -> Option<Deletion> {
        let range = self
            .ranges
            .iter()
            .filter(|(r, _)| r.contains(clustering))
            .map(|(_, d)| *d)
            .max();

        range.max(self.partition)
    }
}
