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

use std::io;
use std::mem;

use log::debug;

use crate::mutation::BaseMutation;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::storage::compact::compacted_get;
use crate::storage::compact::compacted_range;
use crate::storage::BaseTableApi;
use crate::storage::BaseTableRO;
use crate::storage::Immutable;
use crate::storage::Level;
use crate::RowResultStream;
use crate::Value;

/// An in-memory base table: a writable top level over frozen levels.
///
/// ```text
/// | top      | <- apply()
/// | frozen 0 | <- newest flushed
/// | frozen 1 |
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaseTable {
    top: Level,

    /// Newest first.
    frozen: Vec<Immutable>,
}

impl BaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the top level, as if it were persisted, and start a new empty one.
    pub fn flush(&mut self) {
        if self.top.is_empty() {
            return;
        }

        let top = mem::take(&mut self.top);
        debug!("BaseTable::flush(): freeze level with {} rows", top.len());

        self.frozen.insert(0, Immutable::new_from_level(top));
    }

    pub fn frozen_levels(&self) -> usize {
        self.frozen.len()
    }
}

#[async_trait::async_trait]
impl BaseTableRO for BaseTable {
    async fn get_row(&self, key: &BaseKey) -> Result<BaseRow, io::Error> {
        compacted_get(key, Some(&self.top), self.frozen.iter()).await
    }

    async fn range(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error> {
        compacted_range(partition, range, Some(&self.top), self.frozen.iter()).await
    }
}

#[async_trait::async_trait]
impl BaseTableApi for BaseTable {
    async fn apply(&mut self, mutation: BaseMutation) -> Result<(), io::Error> {
        self.top.apply(&mutation)
    }
}
