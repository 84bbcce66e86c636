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

//! Compact operations on multi levels data.
//!
//! Fragments are merged with [`BaseRow::merge`], which does not depend on the order of the
//! levels. How the fragments of a row are spread over levels thus never changes the result.

use std::io;

use futures_util::StreamExt;
use stream_more::KMerge;
use stream_more::StreamMore;

use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::storage::CoveringDeletions;
use crate::storage::FragmentsRO;
use crate::util;
use crate::RowResultStream;
use crate::Value;

/// Get a row from multi levels data.
///
/// Merges the fragment of every level, then applies the covering deletions of every level.
/// Returns an empty row if nothing was written.
///
/// - `TOP`: type of the top, writable level.
/// - `L`: type of the immutable levels.
pub async fn compacted_get<TOP, L>(
    key: &BaseKey,
    top: Option<&TOP>,
    levels: impl IntoIterator<Item = L>,
) -> Result<BaseRow, io::Error>
where
    TOP: FragmentsRO,
    L: FragmentsRO,
{
    let mut row = BaseRow::new(key.clone());
    let mut covering = CoveringDeletions::default();

    if let Some(t) = top {
        row = fold_level(t, key, row, &mut covering).await?;
    }

    for lvl in levels {
        row = fold_level(&lvl, key, row, &mut covering).await?;
    }

    Ok(row.shadow(covering.for_clustering(&key.clustering)))
}

async fn fold_level<L>(
    lvl: &L,
    key: &BaseKey,
    row: BaseRow,
    covering: &mut CoveringDeletions,
) -> Result<BaseRow, io::Error>
where
    L: FragmentsRO,
{
    covering.extend(lvl.covering_deletions(&key.partition).await?);

    match lvl.fragment(key).await? {
        Some(fragment) => Ok(row.merge(&fragment)?),
        None => Ok(row),
    }
}

/// Iterate over the rows of a clustering range of one partition from multi levels.
///
/// The returned stream contains at most one row for each key.
/// Rows shadowed entirely by a deletion are still returned, with the deletion.
///
/// - `TOP` is the type of the top level.
/// - `L` is the type of immutable levels.
///
/// Because the top level is very likely to be a different type from the immutable levels, i.e., it is writable.
pub async fn compacted_range<TOP, L>(
    partition: &Value,
    range: ClusteringRange,
    top: Option<&TOP>,
    levels: impl IntoIterator<Item = L>,
) -> Result<RowResultStream, io::Error>
where
    TOP: FragmentsRO,
    L: FragmentsRO,
{
    let mut kmerge = KMerge::by(util::by_key);
    let mut covering = CoveringDeletions::default();

    if let Some(t) = top {
        covering.extend(t.covering_deletions(partition).await?);
        let strm = t.fragments(partition, range.clone()).await?;
        kmerge = kmerge.merge(strm);
    }

    for lvl in levels {
        covering.extend(lvl.covering_deletions(partition).await?);
        let strm = lvl.fragments(partition, range.clone()).await?;
        kmerge = kmerge.merge(strm);
    }

    // Merge fragments with the same key
    let coalesce = kmerge.coalesce(util::merge_row_results);

    let strm = coalesce.map(move |res| {
        res.map(|row| {
            let deletion = covering.for_clustering(&row.key.clustering);
            row.shadow(deletion)
        })
    });

    Ok(strm.boxed())
}
