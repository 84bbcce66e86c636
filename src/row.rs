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

//! Base table rows: key, row marker, row deletion and cells.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use serde::Deserialize;
use serde::Serialize;

use crate::cell::Cell;
use crate::cell::Deletion;
use crate::cell::LivenessInfo;
use crate::errors::ViewUpdateError;
use crate::Timestamp;
use crate::Value;

/// A clustering key range inside one partition.
///
/// It implements [`RangeBounds<Value>`](std::ops::RangeBounds),
/// thus `range.contains(&clustering)` tells if a row is covered.
pub type ClusteringRange = (Bound<Value>, Bound<Value>);

/// Identifies a base row: (partition key, clustering key).
///
/// Tables without clustering columns use an empty clustering value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseKey {
    pub partition: Value,
    pub clustering: Value,
}

impl BaseKey {
    pub fn new(partition: impl Into<Value>, clustering: impl Into<Value>) -> Self {
        Self {
            partition: partition.into(),
            clustering: clustering.into(),
        }
    }

    pub fn partition_only(partition: impl Into<Value>) -> Self {
        Self::new(partition, Value::new())
    }
}

impl fmt::Display for BaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            String::from_utf8_lossy(&self.partition),
            String::from_utf8_lossy(&self.clustering)
        )
    }
}

/// The state of one base row, or a fragment of it written by one mutation.
///
/// A row is **present** at reference time `now` iff its marker is live, or at least one
/// of its cells is live. A row with neither is logically nonexistent, even if a row
/// deletion or tombstones are still physically kept.
///
/// Rows produced by [`BaseRow::merge`] never keep data shadowed by their own deletion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BaseRow {
    pub key: BaseKey,
    pub liveness: Option<LivenessInfo>,
    pub deletion: Option<Deletion>,
    pub cells: BTreeMap<String, Cell>,
}

impl BaseRow {
    pub fn new(key: BaseKey) -> Self {
        Self {
            key,
            liveness: None,
            deletion: None,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_liveness(mut self, liveness: LivenessInfo) -> Self {
        self.liveness = Some(liveness);
        self
    }

    pub fn with_deletion(mut self, deletion: Deletion) -> Self {
        self.deletion = Some(deletion);
        self
    }

    pub fn with_cell(mut self, column: impl ToString, cell: Cell) -> Self {
        self.cells.insert(column.to_string(), cell);
        self
    }

    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn live_cell(&self, column: &str, now: i64) -> Option<&Cell> {
        self.cells.get(column).filter(|c| c.is_live(now))
    }

    pub fn live_liveness(&self, now: i64) -> Option<&LivenessInfo> {
        self.liveness.as_ref().filter(|l| l.is_live(now))
    }

    pub fn is_present(&self, now: i64) -> bool {
        self.live_liveness(now).is_some() || self.cells.values().any(|c| c.is_live(now))
    }

    /// No marker, no deletion and no cell at all: nothing was ever written.
    pub fn is_empty(&self) -> bool {
        self.liveness.is_none() && self.deletion.is_none() && self.cells.is_empty()
    }

    /// The greatest timestamp among the live marker and the live cells.
    ///
    /// Any of these can independently keep the row present.
    pub fn max_live_timestamp(&self, now: i64) -> Option<Timestamp> {
        let marker = self.live_liveness(now).map(|l| l.timestamp());
        let cells = self
            .cells
            .values()
            .filter(|c| c.is_live(now))
            .map(|c| c.timestamp)
            .max();
        marker.max(cells)
    }

    /// Merge two states of the same row with last-write-wins semantics.
    ///
    /// Markers and cells reconcile pairwise, deletions take the max,
    /// then everything the resulting deletion shadows is purged.
    /// The merge is commutative, associative and idempotent.
    pub fn merge(&self, other: &BaseRow) -> Result<BaseRow, ViewUpdateError> {
        if self.key != other.key {
            return Err(ViewUpdateError::KeyMismatch {
                before: self.key.clone(),
                after: other.key.clone(),
            });
        }

        let mut cells = self.cells.clone();
        for (column, cell) in other.cells.iter() {
            match cells.entry(column.clone()) {
                Entry::Vacant(e) => {
                    e.insert(cell.clone());
                }
                Entry::Occupied(mut e) => {
                    let winner = Cell::reconcile_ref(e.get(), cell).clone();
                    e.insert(winner);
                }
            }
        }

        let merged = BaseRow {
            key: self.key.clone(),
            liveness: LivenessInfo::reconcile_opt(self.liveness, other.liveness),
            deletion: self.deletion.max(other.deletion),
            cells,
        };

        Ok(merged.purged())
    }

    /// Apply a covering deletion, e.g., a partition or range deletion, to this row.
    pub fn shadow(mut self, deletion: Option<Deletion>) -> Self {
        self.deletion = self.deletion.max(deletion);
        self.purged()
    }

    fn purged(mut self) -> Self {
        if let Some(d) = self.deletion {
            if self.liveness.is_some_and(|l| d.deletes(l.timestamp())) {
                self.liveness = None;
            }
            self.cells.retain(|_, c| !d.deletes(c.timestamp));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::ops::RangeBounds;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cell::Expiry;

    fn b(x: impl ToString) -> Vec<u8> {
        x.to_string().into_bytes()
    }

    fn key() -> BaseKey {
        BaseKey::new("1", "1")
    }

    #[test]
    fn test_base_key_order_and_range() {
        assert!(BaseKey::new("1", "2") < BaseKey::new("2", "1"));
        assert!(BaseKey::new("1", "1") < BaseKey::new("1", "2"));

        let range: ClusteringRange = (Bound::Included(b(2)), Bound::Excluded(b(4)));
        assert!(!range.contains(&b(1)));
        assert!(range.contains(&b(2)));
        assert!(range.contains(&b(3)));
        assert!(!range.contains(&b(4)));

        assert_eq!("(1, )", BaseKey::partition_only("1").to_string());
    }

    #[test]
    fn test_row_presence() {
        let now = 1000;

        assert!(!BaseRow::new(key()).is_present(now));

        // Marker alone keeps the row present.
        let r = BaseRow::new(key()).with_liveness(LivenessInfo::live(0));
        assert!(r.is_present(now));

        // A single live cell keeps the row present.
        let r = BaseRow::new(key()).with_cell("b", Cell::new(10, b(1)));
        assert!(r.is_present(now));

        // Only tombstones: a placeholder, not a row.
        let r = BaseRow::new(key()).with_cell("b", Cell::tombstone(11));
        assert!(!r.is_present(now));

        // Only an expired cell.
        let r = BaseRow::new(key())
            .with_cell("b", Cell::new(10, b(1)).with_expiry(Some(Expiry::new(3, 990))));
        assert!(!r.is_present(now));
        assert!(r.is_present(992));
    }

    #[test]
    fn test_max_live_timestamp() {
        let now = 1000;
        let r = BaseRow::new(key())
            .with_liveness(LivenessInfo::live(5))
            .with_cell("a", Cell::new(3, b(1)))
            .with_cell("b", Cell::tombstone(20))
            .with_cell("c", Cell::new(9, b(1)));
        assert_eq!(Some(9), r.max_live_timestamp(now));

        assert_eq!(None, BaseRow::new(key()).max_live_timestamp(now));
    }

    #[test]
    fn test_merge_last_write_wins() -> anyhow::Result<()> {
        let r1 = BaseRow::new(key())
            .with_cell("a", Cell::new(10, b(1)))
            .with_cell("b", Cell::new(10, b(1)));
        let r2 = BaseRow::new(key())
            .with_liveness(LivenessInfo::live(0))
            .with_cell("a", Cell::new(5, b(2)))
            .with_cell("b", Cell::tombstone(11));

        let got = r1.merge(&r2)?;
        assert_eq!(
            BaseRow::new(key())
                .with_liveness(LivenessInfo::live(0))
                .with_cell("a", Cell::new(10, b(1)))
                .with_cell("b", Cell::tombstone(11)),
            got
        );

        // Commutative.
        assert_eq!(got, r2.merge(&r1)?);
        // Idempotent.
        assert_eq!(got, got.merge(&r2)?);
        Ok(())
    }

    #[test]
    fn test_merge_purges_shadowed_data() -> anyhow::Result<()> {
        let existing = BaseRow::new(key())
            .with_liveness(LivenessInfo::live(0))
            .with_cell("a", Cell::tombstone(1))
            .with_cell("b", Cell::new(20, b(1)));
        let delete = BaseRow::new(key()).with_deletion(Deletion::new(14));

        let got = existing.merge(&delete)?;
        assert_eq!(
            BaseRow::new(key())
                .with_deletion(Deletion::new(14))
                .with_cell("b", Cell::new(20, b(1))),
            got
        );

        // A later write older than the deletion is ignored.
        let late = BaseRow::new(key()).with_cell("a", Cell::new(13, b(1)));
        assert_eq!(got, got.merge(&late)?);
        Ok(())
    }

    #[test]
    fn test_merge_key_mismatch() {
        let r1 = BaseRow::new(key());
        let r2 = BaseRow::new(BaseKey::new("1", "2"));

        let got = r1.merge(&r2);
        assert_eq!(
            Err(ViewUpdateError::KeyMismatch {
                before: key(),
                after: BaseKey::new("1", "2"),
            }),
            got
        );
    }

    #[test]
    fn test_shadow() {
        let r = BaseRow::new(key())
            .with_liveness(LivenessInfo::live(0))
            .with_cell("c", Cell::new(0, b(1)));

        let got = r.clone().shadow(Some(Deletion::new(2)));
        assert_eq!(BaseRow::new(key()).with_deletion(Deletion::new(2)), got);
        assert!(!got.is_present(1000));
        assert!(!got.is_empty());

        assert_eq!(r.clone(), r.shadow(None));
    }
}
