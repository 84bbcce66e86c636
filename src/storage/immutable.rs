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
use std::ops::Deref;
use std::sync::Arc;

use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::storage::CoveringDeletions;
use crate::storage::FragmentsRO;
use crate::storage::Level;
use crate::RowResultStream;
use crate::Value;

/// A single **immutable** level, standing for a flushed segment.
///
/// Cloning shares the underlying level.
#[derive(Debug, Clone)]
pub struct Immutable {
    level: Arc<Level>,
}

impl Immutable {
    pub fn new(level: Arc<Level>) -> Self {
        Self { level }
    }

    pub fn new_from_level(level: Level) -> Self {
        Self::new(Arc::new(level))
    }
}

impl AsRef<Level> for Immutable {
    fn as_ref(&self) -> &Level {
        self.level.as_ref()
    }
}

impl Deref for Immutable {
    type Target = Level;

    fn deref(&self) -> &Self::Target {
        self.level.as_ref()
    }
}

#[async_trait::async_trait]
impl FragmentsRO for Immutable {
    async fn fragment(&self, key: &BaseKey) -> Result<Option<BaseRow>, io::Error> {
        self.level.fragment(key).await
    }

    async fn fragments(
        &self,
        partition: &Value,
        range: ClusteringRange,
    ) -> Result<RowResultStream, io::Error> {
        let strm = self.level.fragments(partition, range).await?;
        Ok(strm)
    }

    async fn covering_deletions(&self, partition: &Value) -> Result<CoveringDeletions, io::Error> {
        self.level.covering_deletions(partition).await
    }
}
