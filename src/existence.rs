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

//! Decides whether a base row maps to a view row, and which one.
//!
//! Existence is evaluated on one snapshot at a time.
//! `before` and `after` are resolved independently: a row deleted through one column
//! can be present again through another column written with an older timestamp.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::cell::LivenessInfo;
use crate::row::BaseKey;
use crate::row::BaseRow;
use crate::view::ViewDefinition;
use crate::Value;

/// Identifies a view row: the base key plus the promoted column value, if the view has one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewRowIdentity {
    pub base: BaseKey,
    pub promoted: Option<Value>,
}

impl ViewRowIdentity {
    pub fn new(base: BaseKey, promoted: Option<Value>) -> Self {
        Self { base, promoted }
    }
}

impl fmt::Display for ViewRowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.promoted {
            None => write!(f, "{}", self.base),
            Some(v) => write!(f, "{}+{}", self.base, String::from_utf8_lossy(v)),
        }
    }
}

/// Return the view row `row` maps to at reference time `now`, if any.
///
/// For a strict view the promoted column must be live;
/// otherwise the base row must be present.
pub fn resolve(view: &ViewDefinition, row: &BaseRow, now: i64) -> Option<ViewRowIdentity> {
    match view.promoted() {
        Some(p) => {
            let value = row.live_cell(p, now)?.value.clone()?;
            Some(ViewRowIdentity::new(row.key.clone(), Some(value)))
        }
        None => {
            if row.is_present(now) {
                Some(ViewRowIdentity::new(row.key.clone(), None))
            } else {
                None
            }
        }
    }
}

/// Same as [`resolve`], applied to the snapshot taken before a mutation.
pub fn existed_before(
    view: &ViewDefinition,
    before: &BaseRow,
    now: i64,
) -> Option<ViewRowIdentity> {
    resolve(view, before, now)
}

/// The row marker a view row derived from `row` carries.
///
/// A strict view row lives exactly as long as its promoted cell.
/// A non-strict view row mirrors the base row marker.
pub fn view_liveness(view: &ViewDefinition, row: &BaseRow) -> Option<LivenessInfo> {
    match view.promoted() {
        Some(p) => {
            let cell = row.cell(p)?;
            if cell.is_tombstone() {
                return None;
            }
            Some(LivenessInfo::Live {
                timestamp: cell.timestamp,
                expiry: cell.expiry,
            })
        }
        None => row.liveness,
    }
}
