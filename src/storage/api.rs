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

//! Storage interfaces consumed and fed by the view update engine.

use std::io;

use crate::intent::ViewUpdate;
use crate::mutation::BaseMutation;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::storage::CoveringDeletions;
use crate::RowResultStream;
use crate::Value;

/// Read access to the fragments stored in a single level.
///
/// A level holds partial rows. Only the merge of all levels is a base row.
#[async_trait::async_trait]
pub trait FragmentsRO: Send + Sync {
    /// The fragment of `key` stored in this level, if any.
    async fn fragment(&self, key: &BaseKey) -> Result<Option<BaseRow>, io::Error>;

    /// Fragments of `partition` whose clustering key is in `range`, in key order.
    async fn fragments(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error>;

    /// Partition and range deletions of `partition` stored in this level.
    ///
    /// They cover fragments of every level, not only of this one.
    async fn covering_deletions(&self, partition: &Value) -> Result<CoveringDeletions, io::Error>;
}

#[async_trait::async_trait]
impl<T> FragmentsRO for &T
where T: FragmentsRO
{
    async fn fragment(&self, key: &BaseKey) -> Result<Option<BaseRow>, io::Error> {
        (**self).fragment(key).await
    }

    async fn fragments(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error> {
        (**self).fragments(partition, range).await
    }

    async fn covering_deletions(&self, partition: &Value) -> Result<CoveringDeletions, io::Error> {
        (**self).covering_deletions(partition).await
    }
}

/// Read the current state of base rows.
///
/// This is the `read_before` interface: the result reflects every mutation applied so far,
/// no matter where its data currently resides.
#[async_trait::async_trait]
pub trait BaseTableRO: Send + Sync {
    /// Get a row by key.
    ///
    /// A row that was never written is returned empty, see [`BaseRow::is_empty`].
    async fn get_row(&self, key: &BaseKey) -> Result<BaseRow, io::Error>;

    /// Rows of `partition` whose clustering key is in `range`, in key order.
    ///
    /// Rows are returned with covering deletions applied. Rows that are no longer present
    /// may still be returned.
    async fn range(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error>;
}

#[async_trait::async_trait]
impl<T> BaseTableRO for &T
where T: BaseTableRO
{
    async fn get_row(&self, key: &BaseKey) -> Result<BaseRow, io::Error> {
        (**self).get_row(key).await
    }

    async fn range(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error> {
        (**self).range(partition, range).await
    }
}

/// Write access to the base table.
#[async_trait::async_trait]
pub trait BaseTableApi: BaseTableRO {
    async fn apply(&mut self, mutation: BaseMutation) -> Result<(), io::Error>;
}

/// The view write path: persists the intents generated for each view.
#[async_trait::async_trait]
pub trait ViewWriteApi: Send + Sync {
    async fn apply(&mut self, updates: Vec<ViewUpdate>) -> Result<(), io::Error>;
}
