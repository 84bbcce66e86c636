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

//! Compares the state of a base row before and after a mutation.

use std::collections::BTreeMap;

use itertools::EitherOrBoth;
use itertools::Itertools;

use crate::cell::Deletion;
use crate::errors::ViewUpdateError;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::Timestamp;

/// How the liveness of one column changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDelta {
    Unchanged,

    BecameLive { timestamp: Timestamp },

    /// `at` is the timestamp of the tombstone or expiring cell that replaced the value,
    /// or of the row deletion that purged it.
    BecameDead { at: Timestamp },

    /// Live before and after, but a different cell won.
    ValueChanged { old_ts: Timestamp, new_ts: Timestamp },
}

/// How the row marker changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessTransition {
    Unchanged,
    Appeared { timestamp: Timestamp },
    Disappeared { at: Timestamp },
    TimestampChanged { old: Timestamp, new: Timestamp },
}

/// The changes a mutation made to one base row, evaluated at one reference time.
///
/// Owns both snapshots for the processing of that single mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDelta {
    before: BaseRow,
    after: BaseRow,
    now: i64,
    columns: BTreeMap<String, ColumnDelta>,
    liveness: LivenessTransition,
}

impl RowDelta {
    pub fn key(&self) -> &BaseKey {
        &self.after.key
    }

    pub fn before(&self) -> &BaseRow {
        &self.before
    }

    pub fn after(&self) -> &BaseRow {
        &self.after
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    /// The change of `column`; a column absent from both snapshots is unchanged.
    pub fn column(&self, column: &str) -> ColumnDelta {
        self.columns
            .get(column)
            .copied()
            .unwrap_or(ColumnDelta::Unchanged)
    }

    /// Iterate over the changed columns in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnDelta)> + '_ {
        self.columns.iter().map(|(c, d)| (c.as_str(), *d))
    }

    pub fn liveness(&self) -> LivenessTransition {
        self.liveness
    }

    /// The row deletion introduced by this mutation, if it raised the row's deletion.
    pub fn new_deletion(&self) -> Option<Deletion> {
        if self.after.deletion > self.before.deletion {
            self.after.deletion
        } else {
            None
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.columns.is_empty() && self.liveness == LivenessTransition::Unchanged
    }
}

/// Compute the [`RowDelta`] between two snapshots of the same base row.
///
/// `after` is expected to be `before` merged with the mutation.
/// Cell and marker liveness are evaluated at `now` for both snapshots.
pub fn diff(before: BaseRow, after: BaseRow, now: i64) -> Result<RowDelta, ViewUpdateError> {
    if before.key != after.key {
        return Err(ViewUpdateError::KeyMismatch {
            before: before.key,
            after: after.key,
        });
    }

    let mut columns = BTreeMap::new();

    let names = before
        .cells
        .keys()
        .merge_join_by(after.cells.keys(), |a, b| a.cmp(b))
        .map(|either| match either {
            EitherOrBoth::Both(c, _) | EitherOrBoth::Left(c) | EitherOrBoth::Right(c) => c,
        });

    for column in names {
        let delta = column_delta(&before, &after, column, now);
        if delta != ColumnDelta::Unchanged {
            columns.insert(column.clone(), delta);
        }
    }

    let liveness = liveness_transition(&before, &after, now);

    Ok(RowDelta {
        before,
        after,
        now,
        columns,
        liveness,
    })
}

fn column_delta(before: &BaseRow, after: &BaseRow, column: &str, now: i64) -> ColumnDelta {
    let b = before.live_cell(column, now);
    let a = after.live_cell(column, now);

    match (b, a) {
        (None, None) => ColumnDelta::Unchanged,
        (None, Some(a)) => ColumnDelta::BecameLive {
            timestamp: a.timestamp,
        },
        (Some(b), None) => {
            let at = after
                .cell(column)
                .map(|c| c.timestamp)
                .or(after.deletion.map(|d| d.marked_at))
                .unwrap_or(b.timestamp);
            ColumnDelta::BecameDead { at }
        }
        (Some(b), Some(a)) => {
            if b == a {
                ColumnDelta::Unchanged
            } else {
                ColumnDelta::ValueChanged {
                    old_ts: b.timestamp,
                    new_ts: a.timestamp,
                }
            }
        }
    }
}

fn liveness_transition(before: &BaseRow, after: &BaseRow, now: i64) -> LivenessTransition {
    let b = before.live_liveness(now);
    let a = after.live_liveness(now);

    match (b, a) {
        (None, None) => LivenessTransition::Unchanged,
        (None, Some(a)) => LivenessTransition::Appeared {
            timestamp: a.timestamp(),
        },
        (Some(b), None) => {
            let at = after
                .liveness
                .map(|l| l.timestamp())
                .or(after.deletion.map(|d| d.marked_at))
                .unwrap_or(b.timestamp());
            LivenessTransition::Disappeared { at }
        }
        (Some(b), Some(a)) => {
            if b == a {
                LivenessTransition::Unchanged
            } else {
                LivenessTransition::TimestampChanged {
                    old: b.timestamp(),
                    new: a.timestamp(),
                }
            }
        }
    }
}
