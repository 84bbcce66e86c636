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

//! Drives base mutations through diff, existence resolution and intent building,
//! and keeps the views of a base table up to date.

use std::sync::Arc;

use futures::lock::Mutex;
use futures_util::TryStreamExt;
use log::debug;
use log::warn;

use crate::builder;
use crate::cell::Deletion;
use crate::config::EngineConfig;
use crate::diff::diff;
use crate::errors::EngineError;
use crate::intent::ViewUpdate;
use crate::mutation::BaseMutation;
use crate::range_delete::handle_range_delete;
use crate::row::BaseRow;
use crate::row::ClusteringRange;
use crate::sequencer::PartitionSequencer;
use crate::storage::BaseTableApi;
use crate::storage::ViewWriteApi;
use crate::view::ViewDefinition;
use crate::Value;

/// Applies base mutations and the view updates they imply.
///
/// For each mutation, under the exclusion of its partition:
/// read the affected base rows, compute the intents of every view,
/// hand the intents to the view writer, then write the mutation to the base table.
pub struct ViewUpdateEngine<B, W> {
    base: Mutex<B>,
    writer: Mutex<W>,
    views: Vec<Arc<ViewDefinition>>,
    sequencer: PartitionSequencer,
    config: EngineConfig,
}

impl<B, W> ViewUpdateEngine<B, W>
where
    B: BaseTableApi,
    W: ViewWriteApi,
{
    pub fn new(base: B, writer: W, config: EngineConfig) -> Self {
        Self {
            base: Mutex::new(base),
            writer: Mutex::new(writer),
            views: vec![],
            sequencer: PartitionSequencer::new(),
            config,
        }
    }

    pub fn with_view(mut self, view: Arc<ViewDefinition>) -> Self {
        self.views.push(view);
        self
    }

    pub fn views(&self) -> &[Arc<ViewDefinition>] {
        &self.views
    }

    pub fn base(&self) -> &Mutex<B> {
        &self.base
    }

    pub fn writer(&self) -> &Mutex<W> {
        &self.writer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `mutation` to the base table and its views, evaluating TTLs at `now`.
    ///
    /// Returns the non-empty view updates that were written.
    /// On error the base table is left untouched, and the same mutation can be retried.
    pub async fn apply(
        &self,
        mutation: BaseMutation,
        now: i64,
    ) -> Result<Vec<ViewUpdate>, EngineError> {
        let guard = self.sequencer.acquire(mutation.partition()).await;

        let res = self.apply_in_partition(mutation, now).await;

        drop(guard);
        if self.config.prune_idle_partitions {
            self.sequencer.prune_idle();
        }

        res
    }

    async fn apply_in_partition(
        &self,
        mutation: BaseMutation,
        now: i64,
    ) -> Result<Vec<ViewUpdate>, EngineError> {
        let updates = match &mutation {
            BaseMutation::Row(fragment) => self.row_updates(fragment, now).await?,
            BaseMutation::RangeDelete {
                partition,
                range,
                deletion,
            } => {
                self.range_updates(partition, range.clone(), *deletion, now)
                    .await?
            }
            BaseMutation::PartitionDelete {
                partition,
                deletion,
            } => {
                self.range_updates(partition, BaseMutation::full_range(), *deletion, now)
                    .await?
            }
        };

        let updates = updates
            .into_iter()
            .filter(|u| !u.is_empty())
            .collect::<Vec<_>>();

        // Views are written first: if the base write then fails, a retry reads the same
        // `before` and regenerates the same idempotent intents.
        if !updates.is_empty() {
            for u in updates.iter() {
                debug!(
                    "ViewUpdateEngine::apply(): view={} intents={:?}",
                    u.view, u.intents
                );
            }
            self.writer.lock().await.apply(updates.clone()).await?;
        }

        self.base.lock().await.apply(mutation).await?;

        Ok(updates)
    }

    async fn row_updates(
        &self,
        fragment: &BaseRow,
        now: i64,
    ) -> Result<Vec<ViewUpdate>, EngineError> {
        let before = self.base.lock().await.get_row(&fragment.key).await?;
        let after = before.merge(fragment)?;
        let delta = diff(before, after, now)?;

        let mut updates = Vec::with_capacity(self.views.len());
        for view in self.views.iter() {
            let intents = builder::generate(view, &delta)?;
            updates.push(ViewUpdate::new(view.name(), intents));
        }
        Ok(updates)
    }

    /// Scan the whole range before the deletion is applied, then build the row deletions.
    async fn range_updates(
        &self,
        partition: &Value,
        range: ClusteringRange,
        deletion: Deletion,
        now: i64,
    ) -> Result<Vec<ViewUpdate>, EngineError> {
        let strm = {
            let base = self.base.lock().await;
            base.range(partition, range).await?
        };
        let rows = strm.try_collect::<Vec<_>>().await?;

        if rows.len() > self.config.range_scan_warn_threshold {
            warn!(
                "ViewUpdateEngine: range deletion {} scans {} rows in partition {}",
                deletion,
                rows.len(),
                String::from_utf8_lossy(partition)
            );
        }

        let mut updates = Vec::with_capacity(self.views.len());
        for view in self.views.iter() {
            let intents = handle_range_delete(view, &rows, deletion, now)?;
            updates.push(ViewUpdate::new(view.name(), intents));
        }
        Ok(updates)
    }
}
