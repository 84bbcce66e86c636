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

//! Mutations to apply to a view, generated from one base mutation.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::cell::Cell;
use crate::cell::Deletion;
use crate::cell::LivenessInfo;
use crate::existence::ViewRowIdentity;
use crate::Timestamp;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDeletionKind {
    /// Shadows the marker and every cell written at or before the deletion timestamp.
    Regular,

    /// Withdraws only the row marker; cells are left alone and a newer marker revives the row.
    Shadowable,
}

/// One change to one view row.
///
/// Every intent is independently applicable, and applying it twice has no further effect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Write cells verbatim, optionally with a row marker and a row deletion.
    Upsert {
        row: ViewRowIdentity,
        liveness: Option<LivenessInfo>,
        deletion: Option<Deletion>,
        cells: BTreeMap<String, Cell>,
    },

    /// Write a tombstone for each column, at that column's own timestamp.
    DeleteColumns {
        row: ViewRowIdentity,
        columns: BTreeMap<String, Timestamp>,
    },

    DeleteRow {
        row: ViewRowIdentity,
        timestamp: Timestamp,
        kind: RowDeletionKind,
    },
}

impl MutationIntent {
    pub fn row(&self) -> &ViewRowIdentity {
        match self {
            MutationIntent::Upsert { row, .. } => row,
            MutationIntent::DeleteColumns { row, .. } => row,
            MutationIntent::DeleteRow { row, .. } => row,
        }
    }

    pub fn delete_row(row: ViewRowIdentity, timestamp: Timestamp) -> Self {
        MutationIntent::DeleteRow {
            row,
            timestamp,
            kind: RowDeletionKind::Regular,
        }
    }

    pub fn withdraw_row(row: ViewRowIdentity, timestamp: Timestamp) -> Self {
        MutationIntent::DeleteRow {
            row,
            timestamp,
            kind: RowDeletionKind::Shadowable,
        }
    }

    pub fn is_row_deletion(&self) -> bool {
        matches!(self, MutationIntent::DeleteRow { .. })
    }
}

/// The intents generated for one view by one base mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub view: String,
    pub intents: Vec<MutationIntent>,
}

impl ViewUpdate {
    pub fn new(view: impl ToString, intents: Vec<MutationIntent>) -> Self {
        Self {
            view: view.to_string(),
            intents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
