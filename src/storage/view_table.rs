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

//! In-memory view storage.
//!
//! A view row is stored the same way as a base row: marker, row deletion and cells,
//! all merged last-write-wins. Applying an intent is therefore idempotent, and the order
//! in which intents arrive does not matter.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use crate::cell::Cell;
use crate::cell::Deletion;
use crate::cell::LivenessInfo;
use crate::existence::ViewRowIdentity;
use crate::intent::MutationIntent;
use crate::intent::RowDeletionKind;
use crate::intent::ViewUpdate;
use crate::row::BaseRow;
use crate::storage::ViewWriteApi;
use crate::view::ViewDefinition;
use crate::Value;

/// The visible content of a view: selected live columns of every visible row.
pub type ViewContents = BTreeMap<ViewRowIdentity, BTreeMap<String, Value>>;

/// The stored rows of one view.
#[derive(Debug, Clone)]
pub struct ViewTable {
    definition: Arc<ViewDefinition>,
    rows: BTreeMap<ViewRowIdentity, BaseRow>,
}

impl ViewTable {
    pub fn new(definition: Arc<ViewDefinition>) -> Self {
        Self {
            definition,
            rows: BTreeMap::new(),
        }
    }

    pub fn definition(&self) -> &Arc<ViewDefinition> {
        &self.definition
    }

    pub fn apply(&mut self, intent: &MutationIntent) -> Result<(), io::Error> {
        let id = intent.row();

        let fragment = BaseRow::new(id.base.clone());
        let fragment = match intent {
            MutationIntent::Upsert {
                liveness,
                deletion,
                cells,
                ..
            } => BaseRow {
                liveness: *liveness,
                deletion: *deletion,
                cells: cells.clone(),
                ..fragment
            },
            MutationIntent::DeleteColumns { columns, .. } => BaseRow {
                cells: columns
                    .iter()
                    .map(|(c, ts)| (c.clone(), Cell::tombstone(*ts)))
                    .collect(),
                ..fragment
            },
            MutationIntent::DeleteRow {
                timestamp,
                kind: RowDeletionKind::Regular,
                ..
            } => fragment.with_deletion(Deletion::new(*timestamp)),
            MutationIntent::DeleteRow {
                timestamp,
                kind: RowDeletionKind::Shadowable,
                ..
            } => fragment.with_liveness(LivenessInfo::withdrawn(*timestamp)),
        };

        let merged = match self.rows.get(id) {
            Some(existing) => existing.merge(&fragment)?,
            None => BaseRow::new(id.base.clone()).merge(&fragment)?,
        };
        self.rows.insert(id.clone(), merged);
        Ok(())
    }

    /// The stored state of a view row, visible or not.
    pub fn stored(&self, id: &ViewRowIdentity) -> Option<&BaseRow> {
        self.rows.get(id)
    }

    /// A strict view row needs a live marker, other view rows a live marker or any live cell.
    pub fn is_visible(&self, id: &ViewRowIdentity, now: i64) -> bool {
        self.rows.get(id).is_some_and(|row| self.visible(row, now))
    }

    fn visible(&self, row: &BaseRow, now: i64) -> bool {
        if self.definition.is_strict() {
            row.live_liveness(now).is_some()
        } else {
            row.is_present(now)
        }
    }

    /// Read the visible rows at reference time `now`, with their selected live columns.
    pub fn read(&self, now: i64) -> ViewContents {
        self.rows
            .iter()
            .filter(|(_, row)| self.visible(row, now))
            .map(|(id, row)| {
                let columns = row
                    .cells
                    .iter()
                    .filter(|(c, _)| self.definition.is_selected(c))
                    .filter_map(|(c, cell)| cell.live_value(now).map(|v| (c.clone(), v.clone())))
                    .collect();
                (id.clone(), columns)
            })
            .collect()
    }
}

/// The views of one base table, by name.
#[derive(Debug, Clone, Default)]
pub struct ViewTables {
    tables: BTreeMap<String, ViewTable>,
}

impl ViewTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, definition: Arc<ViewDefinition>) {
        let name = definition.name().to_string();
        self.tables.insert(name, ViewTable::new(definition));
    }

    pub fn get(&self, name: &str) -> Option<&ViewTable> {
        self.tables.get(name)
    }
}

#[async_trait::async_trait]
impl ViewWriteApi for ViewTables {
    /// Apply all updates, or none if one of them targets an unknown view.
    async fn apply(&mut self, updates: Vec<ViewUpdate>) -> Result<(), io::Error> {
        if let Some(u) = updates.iter().find(|u| !self.tables.contains_key(&u.view)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("ViewTables::apply(): unknown view: {}", u.view),
            ));
        }

        for update in updates {
            if let Some(table) = self.tables.get_mut(&update.view) {
                for intent in update.intents.iter() {
                    table.apply(intent)?;
                }
            }
        }
        Ok(())
    }
}
