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

//! Base table mutations and a builder for row-level writes.

use std::ops::Bound;

use crate::cell::Cell;
use crate::cell::Deletion;
use crate::cell::Expiry;
use crate::cell::LivenessInfo;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::Timestamp;
use crate::Value;

/// A write to the base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseMutation {
    /// Insert, update, column delete or row delete: a fragment merged into one row.
    Row(BaseRow),

    /// Deletes every row of `partition` whose clustering key is in `range`.
    RangeDelete {
        partition: Value,
        range: ClusteringRange,
        deletion: Deletion,
    },

    PartitionDelete {
        partition: Value,
        deletion: Deletion,
    },
}

impl BaseMutation {
    pub fn partition(&self) -> &Value {
        match self {
            BaseMutation::Row(row) => &row.key.partition,
            BaseMutation::RangeDelete { partition, .. } => partition,
            BaseMutation::PartitionDelete { partition, .. } => partition,
        }
    }

    /// Delete a single row at `timestamp`.
    pub fn delete_row(key: BaseKey, timestamp: Timestamp) -> Self {
        BaseMutation::Row(BaseRow::new(key).with_deletion(Deletion::new(timestamp)))
    }

    pub fn delete_range(
        partition: impl Into<Value>,
        range: ClusteringRange,
        timestamp: Timestamp,
    ) -> Self {
        BaseMutation::RangeDelete {
            partition: partition.into(),
            range,
            deletion: Deletion::new(timestamp),
        }
    }

    pub fn delete_partition(partition: impl Into<Value>, timestamp: Timestamp) -> Self {
        BaseMutation::PartitionDelete {
            partition: partition.into(),
            deletion: Deletion::new(timestamp),
        }
    }

    /// The full clustering range, used by partition deletions.
    pub fn full_range() -> ClusteringRange {
        (Bound::Unbounded, Bound::Unbounded)
    }
}

/// Builds a row fragment for an insert-style or update-style write.
///
/// An insert sets the row marker, an update only writes cells.
/// Setting a column to null writes a tombstone.
///
/// ```
/// use view_update::mutation::RowUpdate;
/// use view_update::row::BaseKey;
///
/// let m = RowUpdate::update(BaseKey::new("1", "1"), 10)
///     .set("b", "1")
///     .delete("c")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RowUpdate {
    key: BaseKey,
    timestamp: Timestamp,
    insert: bool,
    expiry: Option<Expiry>,
    columns: Vec<(String, Option<Value>)>,
}

impl RowUpdate {
    pub fn insert(key: BaseKey, timestamp: Timestamp) -> Self {
        Self {
            key,
            timestamp,
            insert: true,
            expiry: None,
            columns: vec![],
        }
    }

    pub fn update(key: BaseKey, timestamp: Timestamp) -> Self {
        Self {
            insert: false,
            ..Self::insert(key, timestamp)
        }
    }

    /// Written values and the row marker expire `ttl` seconds after `now`.
    pub fn with_ttl(mut self, ttl: u32, now: i64) -> Self {
        self.expiry = Some(Expiry::new(ttl, now));
        self
    }

    pub fn set(mut self, column: impl ToString, value: impl Into<Value>) -> Self {
        self.columns.push((column.to_string(), Some(value.into())));
        self
    }

    /// Write a tombstone for `column`, i.e., `SET column = null` or `DELETE column`.
    pub fn delete(mut self, column: impl ToString) -> Self {
        self.columns.push((column.to_string(), None));
        self
    }

    pub fn into_row(self) -> BaseRow {
        let mut row = BaseRow::new(self.key);

        if self.insert {
            row.liveness = Some(LivenessInfo::Live {
                timestamp: self.timestamp,
                expiry: self.expiry,
            });
        }

        for (column, value) in self.columns {
            let cell = match value {
                Some(v) => Cell::new(self.timestamp, v).with_expiry(self.expiry),
                None => Cell::tombstone(self.timestamp),
            };
            row.cells.insert(column, cell);
        }

        row
    }

    pub fn build(self) -> BaseMutation {
        BaseMutation::Row(self.into_row())
    }
}
