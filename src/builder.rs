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

//! Turns a [`RowDelta`] into the [`MutationIntent`]s of one view.
//!
//! | before | after                | intents                                             |
//! |--------|----------------------|-----------------------------------------------------|
//! | absent | absent               | none                                                |
//! | absent | present              | full image of the view row                          |
//! | present| absent               | row deletion, plus scoped changes it does not cover |
//! | present| present, same row    | scoped changes only                                 |
//! | present| present, other row   | removal of the old row, full image of the new one   |
//!
//! A scoped change is written at the timestamp of the base cell that caused it,
//! so a tombstone for one column never shadows an independent write to another.

use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::cell::Deletion;
use crate::cell::LivenessInfo;
use crate::diff::ColumnDelta;
use crate::diff::LivenessTransition;
use crate::diff::RowDelta;
use crate::errors::ViewUpdateError;
use crate::existence::existed_before;
use crate::existence::resolve;
use crate::existence::view_liveness;
use crate::existence::ViewRowIdentity;
use crate::intent::MutationIntent;
use crate::row::BaseRow;
use crate::view::ViewDefinition;
use crate::Timestamp;

/// Resolve both snapshots of `delta` against `view` and build the intents.
pub fn generate(
    view: &ViewDefinition,
    delta: &RowDelta,
) -> Result<Vec<MutationIntent>, ViewUpdateError> {
    view.check_row(delta.before())?;
    view.check_row(delta.after())?;

    let now = delta.now();
    let before = existed_before(view, delta.before(), now);
    let after = resolve(view, delta.after(), now);

    Ok(build(view, before, after, delta))
}

/// Build the intents for one view from the existence of the view row before and after the
/// mutation.
pub fn build(
    view: &ViewDefinition,
    existed_before: Option<ViewRowIdentity>,
    existed_after: Option<ViewRowIdentity>,
    delta: &RowDelta,
) -> Vec<MutationIntent> {
    match (existed_before, existed_after) {
        (None, None) => vec![],
        (None, Some(id)) => full_image(view, id, delta.after()),
        (Some(id), None) => remove(view, id, delta),
        (Some(old), Some(new)) if old == new => scoped(view, new, delta, None).into_intents(),
        (Some(old), Some(new)) => {
            let mut intents = remove(view, old, delta);
            intents.extend(full_image(view, new, delta.after()));
            intents
        }
    }
}

/// Intents for a view row that stopped resolving to `id`.
fn remove(view: &ViewDefinition, id: ViewRowIdentity, delta: &RowDelta) -> Vec<MutationIntent> {
    let deletion = delta.new_deletion();
    let covered = |ts: Timestamp| deletion.is_some_and(|d| d.deletes(ts));

    let mut intents = vec![];

    if let Some(d) = deletion {
        intents.push(MutationIntent::delete_row(id.clone(), d.marked_at));
    }

    match view.promoted() {
        Some(p) => {
            let changed_at = match delta.column(p) {
                ColumnDelta::Unchanged => None,
                ColumnDelta::BecameLive { timestamp } => Some(timestamp),
                ColumnDelta::BecameDead { at } => Some(at),
                ColumnDelta::ValueChanged { new_ts, .. } => Some(new_ts),
            };

            if let Some(at) = changed_at.filter(|at| !covered(*at)) {
                intents.push(MutationIntent::withdraw_row(id, at));
            }
        }
        None => {
            intents.extend(scoped(view, id, delta, deletion).into_intents());
        }
    }

    intents
}

/// Everything the base row holds for the view row `id`.
///
/// The base row deletion is carried along, so data the base table already dropped is dropped
/// in the view row too, even if it was written there while the row was not visible.
fn full_image(view: &ViewDefinition, id: ViewRowIdentity, after: &BaseRow) -> Vec<MutationIntent> {
    let mut changes = Changes::new(id);
    changes.liveness = view_liveness(view, after);
    changes.deletion = after.deletion;

    for (column, cell) in after.cells.iter().filter(|(c, _)| view.tracks(c)) {
        if cell.is_tombstone() {
            changes.delete(column, cell.timestamp);
        } else {
            changes.upsert(view, column, cell);
        }
    }

    changes.into_intents()
}

/// Per column changes, skipping those shadowed by `covered`.
fn scoped(
    view: &ViewDefinition,
    id: ViewRowIdentity,
    delta: &RowDelta,
    covered: Option<Deletion>,
) -> Changes {
    let after = delta.after();
    let is_covered = |ts: Timestamp| covered.is_some_and(|d| d.deletes(ts));

    let mut changes = Changes::new(id);

    for (column, change) in delta.columns() {
        if !view.tracks(column) {
            continue;
        }

        match change {
            ColumnDelta::Unchanged => {}
            ColumnDelta::BecameLive { .. } | ColumnDelta::ValueChanged { .. } => {
                if let Some(cell) = after.cell(column) {
                    changes.upsert(view, column, cell);
                }
            }
            ColumnDelta::BecameDead { at } => match after.cell(column) {
                // An expired value is written as is, the view evaluates the expiry itself.
                Some(cell) if !cell.is_tombstone() => {
                    if !is_covered(cell.timestamp) {
                        changes.upsert(view, column, cell);
                    }
                }
                Some(cell) => {
                    if !is_covered(cell.timestamp) {
                        changes.delete(column, cell.timestamp);
                    }
                }
                None => {
                    if !is_covered(at) {
                        changes.delete(column, at);
                    }
                }
            },
        }
    }

    match view.promoted() {
        Some(p) => {
            if matches!(
                delta.column(p),
                ColumnDelta::BecameLive { .. } | ColumnDelta::ValueChanged { .. }
            ) {
                changes.liveness = view_liveness(view, after);
            }
        }
        None => match delta.liveness() {
            LivenessTransition::Unchanged => {}
            LivenessTransition::Appeared { .. } | LivenessTransition::TimestampChanged { .. } => {
                changes.liveness = after.liveness;
            }
            LivenessTransition::Disappeared { at } => {
                let marker = after.liveness.unwrap_or(LivenessInfo::withdrawn(at));
                if !is_covered(marker.timestamp()) {
                    changes.liveness = Some(marker);
                }
            }
        },
    }

    changes
}

/// Collects the changes to one view row, then emits at most one upsert and one column deletion.
struct Changes {
    row: ViewRowIdentity,
    liveness: Option<LivenessInfo>,
    deletion: Option<Deletion>,
    cells: BTreeMap<String, Cell>,
    tombstones: BTreeMap<String, Timestamp>,
}

impl Changes {
    fn new(row: ViewRowIdentity) -> Self {
        Self {
            row,
            liveness: None,
            deletion: None,
            cells: BTreeMap::new(),
            tombstones: BTreeMap::new(),
        }
    }

    fn upsert(&mut self, view: &ViewDefinition, column: &str, cell: &Cell) {
        let cell = if view.is_virtual(column) {
            cell.to_virtual()
        } else {
            cell.clone()
        };
        self.cells.insert(column.to_string(), cell);
    }

    fn delete(&mut self, column: &str, timestamp: Timestamp) {
        self.tombstones.insert(column.to_string(), timestamp);
    }

    fn into_intents(self) -> Vec<MutationIntent> {
        let mut intents = vec![];

        if self.liveness.is_some() || self.deletion.is_some() || !self.cells.is_empty() {
            intents.push(MutationIntent::Upsert {
                row: self.row.clone(),
                liveness: self.liveness,
                deletion: self.deletion,
                cells: self.cells,
            });
        }

        if !self.tombstones.is_empty() {
            intents.push(MutationIntent::DeleteColumns {
                row: self.row,
                columns: self.tombstones,
            });
        }

        intents
    }
}
