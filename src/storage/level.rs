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

//! A mutable in-memory level of base table data.
//!
//! The [`Level`] struct stores row fragments in a [`BTreeMap`] ordered by [`BaseKey`],
//! along with the partition and range deletions written to it.

use std::collections::BTreeMap;
use std::io;
use std::ops::Bound;
use std::ops::RangeBounds;

use futures_util::StreamExt;
use log::warn;

use crate::cell::Deletion;
use crate::mutation::BaseMutation;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::storage::CoveringDeletions;
use crate::storage::FragmentsRO;
use crate::RowResultStream;
use crate::Value;

/// A range read returning more rows than this logs a warning.
const BIG_RANGE: usize = 1000;

/// A mutable level of row fragments.
///
/// Fragments written to the same key are merged on write. Partition and range deletions are
/// kept aside: they cover fragments stored in older levels too.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use view_update::mutation::RowUpdate;
/// use view_update::row::BaseKey;
/// use view_update::storage::FragmentsRO;
/// use view_update::storage::Level;
///
/// #[tokio::main]
/// async fn main() -> io::Result<()> {
///     let mut level = Level::default();
///     level.apply(&RowUpdate::insert(BaseKey::new("1", "1"), 0).set("a", "1").build())?;
///
///     let got = level.fragment(&BaseKey::new("1", "1")).await?;
///     assert!(got.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Level {
    rows: BTreeMap<BaseKey, BaseRow>,
    partition_deletions: BTreeMap<Value, Deletion>,
    range_tombstones: BTreeMap<Value, Vec<(ClusteringRange, Deletion)>>,
}

impl Level {
    /// Write a mutation into this level.
    pub fn apply(&mut self, mutation: &BaseMutation) -> Result<(), io::Error> {
        match mutation {
            BaseMutation::Row(fragment) => {
                let merged = match self.rows.get(&fragment.key) {
                    Some(existing) => existing.merge(fragment)?,
                    None => BaseRow::new(fragment.key.clone()).merge(fragment)?,
                };
                self.rows.insert(fragment.key.clone(), merged);
            }
            BaseMutation::RangeDelete {
                partition,
                range,
                deletion,
            } => {
                self.range_tombstones
                    .entry(partition.clone())
                    .or_default()
                    .push((range.clone(), *deletion));
            }
            BaseMutation::PartitionDelete {
                partition,
                deletion,
            } => {
                let d = self
                    .partition_deletions
                    .entry(partition.clone())
                    .or_insert(*deletion);
                *d = (*d).max(*deletion);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
            && self.partition_deletions.is_empty()
            && self.range_tombstones.is_empty()
    }

    /// Number of row fragments in this level.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait::async_trait]
impl FragmentsRO for Level {
    async fn fragment(&self, key: &BaseKey) -> Result<Option<BaseRow>, io::Error> {
        Ok(self.rows.get(key).cloned())
    }

    async fn fragments(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error> {
        let start = match range.start_bound() {
            Bound::Included(c) => Bound::Included(BaseKey::new(partition.clone(), c.clone())),
            Bound::Excluded(c) => Bound::Excluded(BaseKey::new(partition.clone(), c.clone())),
            Bound::Unbounded => Bound::Included(BaseKey::partition_only(partition.clone())),
        };

        // Level is borrowed. It has to copy the result to make the returning stream static.
        let vec = self
            .rows
            .range((start, Bound::Unbounded))
            .take_while(|(k, _)| &k.partition == partition)
            .filter(|(k, _)| range.contains(&k.clustering))
            .map(|(_, row)| row.clone())
            .collect::<Vec<_>>();

        if vec.len() > BIG_RANGE {
            warn!(
                "Level::fragments() returns big range of len={} partition={}",
                vec.len(),
                String::from_utf8_lossy(partition)
            );
        }

        let strm = futures::stream::iter(vec).map(Ok).boxed();
        Ok(strm)
    }

    async fn covering_deletions(&self, partition: &Value) -> Result<CoveringDeletions, io::Error> {
        Ok(CoveringDeletions::new(
            self.partition_deletions.get(partition).copied(),
            self.range_tombstones
                .get(partition)
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cell::Cell;
    use crate::mutation::RowUpdate;

    fn key(p: &str, c: &str) -> BaseKey {
        BaseKey::new(p, c)
    }

    fn b(x: impl ToString) -> Vec<u8> {
        x.to_string().into_bytes()
    }

    #[tokio::test]
    async fn test_level_merges_fragments_on_write() -> anyhow::Result<()> {
        let mut l = Level::default();
        l.apply(&RowUpdate::update(key("1", "1"), 10).set("b", "1").build())?;
        l.apply(&RowUpdate::update(key("1", "1"), 11).delete("b").build())?;
        l.apply(&BaseMutation::delete_row(key("1", "1"), 5))?;

        let got = l.fragment(&key("1", "1")).await?;
        assert_eq!(
            Some(
                BaseRow::new(key("1", "1"))
                    .with_deletion(Deletion::new(5))
                    .with_cell("b", Cell::tombstone(11))
            ),
            got
        );

        assert_eq!(None, l.fragment(&key("1", "2")).await?);
        assert_eq!(1, l.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_level_fragments_in_partition_range() -> anyhow::Result<()> {
        let mut l = Level::default();
        for (p, c) in [("1", "1"), ("1", "2"), ("1", "3"), ("10", "1"), ("2", "1")] {
            l.apply(&RowUpdate::insert(key(p, c), 0).build())?;
        }

        let got = l
            .fragments(&b(1), BaseMutation::full_range())
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        assert_eq!(
            vec![key("1", "1"), key("1", "2"), key("1", "3")],
            got.into_iter().map(|r| r.key).collect::<Vec<_>>()
        );

        let got = l
            .fragments(&b(1), (Bound::Excluded(b(1)), Bound::Included(b(2))))
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        assert_eq!(
            vec![key("1", "2")],
            got.into_iter().map(|r| r.key).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_level_covering_deletions() -> anyhow::Result<()> {
        let mut l = Level::default();
        assert!(l.is_empty());

        l.apply(&BaseMutation::delete_partition("1", 2))?;
        l.apply(&BaseMutation::delete_partition("1", 1))?;
        l.apply(&BaseMutation::delete_range(
            "1",
            (Bound::Included(b(5)), Bound::Unbounded),
            7,
        ))?;
        assert!(!l.is_empty());

        let got = l.covering_deletions(&b(1)).await?;
        assert_eq!(Some(Deletion::new(2)), got.for_clustering(&b(1)));
        assert_eq!(Some(Deletion::new(7)), got.for_clustering(&b(6)));

        let got = l.covering_deletions(&b(2)).await?;
        assert_eq!(CoveringDeletions::default(), got);
        Ok(())
    }
}
