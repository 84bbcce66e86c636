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

//! View updates for range and partition deletions.
//!
//! After such a deletion the affected base rows are indistinguishable from rows that never
//! existed, so the rows have to be read before the deletion is applied.

use std::borrow::Borrow;

use crate::cell::Deletion;
use crate::errors::ViewUpdateError;
use crate::existence::existed_before;
use crate::intent::MutationIntent;
use crate::row::BaseRow;
use crate::view::ViewDefinition;

/// Emit a row deletion at the deletion timestamp for every row of `affected_rows_before` that
/// resolved to a view row.
///
/// The deletion mirrors the base deletion: view data written after it survives, as it does in
/// the base table. Either all intents are returned or an error, never a subset.
pub fn handle_range_delete<I>(
    view: &ViewDefinition,
    affected_rows_before: I,
    deletion: Deletion,
    now: i64,
) -> Result<Vec<MutationIntent>, ViewUpdateError>
where
    I: IntoIterator,
    I::Item: Borrow<BaseRow>,
{
    let mut intents = vec![];

    for row in affected_rows_before {
        let row = row.borrow();
        view.check_row(row)?;

        if let Some(id) = existed_before(view, row, now) {
            intents.push(MutationIntent::delete_row(id, deletion.marked_at));
        }
    }

    Ok(intents)
}
