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

//! Utility functions for merging row streams of several levels.
use std::io;

use crate::row::BaseRow;

/// Result type of a base row fragment read from one level.
type RowResult = Result<BaseRow, io::Error>;

/// Comparator for k-way merging row fragments by key.
///
/// Fragments of the same key may come in any order: merging them is commutative.
///
/// Returns `true` if `r1` should be placed before `r2`.
pub fn by_key(r1: &RowResult, r2: &RowResult) -> bool {
    match (r1, r2) {
        (Ok(a), Ok(b)) => a.key <= b.key,
        // If there is an error, just yield them in order.
        // It's the caller's responsibility to handle the error.
        _ => true,
    }
}

/// Attempts to merge two consecutive row fragments of the same key.
///
/// If the keys are equal, returns `Ok(merged)`.
/// Otherwise, returns `Err((r1, r2))` to indicate that the results should not be merged.
#[allow(clippy::type_complexity)]
pub fn merge_row_results(
    r1: RowResult,
    r2: RowResult,
) -> Result<RowResult, (RowResult, RowResult)> {
    match (r1, r2) {
        (Ok(a), Ok(b)) if a.key == b.key => Ok(a.merge(&b).map_err(io::Error::from)),
        // If there is an error,
        // or the keys differ,
        // just yield them without change.
        (r1, r2) => Err((r1, r2)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Error;
    use std::io::ErrorKind;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cell::Cell;
    use crate::row::BaseKey;

    fn row(c: &str, ts: i64, v: &str) -> RowResult {
        Ok(BaseRow::new(BaseKey::new("1", c)).with_cell("a", Cell::new(ts, v)))
    }

    #[test]
    fn test_by_key() {
        assert!(by_key(&row("1", 5, "x"), &row("2", 1, "y")));
        assert!(!by_key(&row("2", 1, "y"), &row("1", 5, "x")));

        // Same key: either order is fine.
        assert!(by_key(&row("1", 5, "x"), &row("1", 1, "y")));
        assert!(by_key(&row("1", 1, "y"), &row("1", 5, "x")));
    }

    #[test]
    fn test_by_key_with_errors() {
        let err: RowResult = Err(Error::new(ErrorKind::Other, "test error"));
        assert!(by_key(&err, &row("1", 1, "x")));
        assert!(by_key(&row("1", 1, "x"), &err));
    }

    #[test]
    fn test_merge_row_results_same_key() {
        let got = merge_row_results(row("1", 1, "old"), row("1", 5, "new"));
        let Ok(Ok(got)) = got else {
            panic!("expect merged row");
        };
        assert_eq!(Some(&Cell::new(5, "new")), got.cell("a"));
    }

    #[test]
    fn test_merge_row_results_different_keys() {
        let got = merge_row_results(row("1", 1, "x"), row("2", 1, "y"));
        let Err((r1, r2)) = got else {
            panic!("expect unmerged pair");
        };
        assert_eq!(BaseKey::new("1", "1"), r1.unwrap().key);
        assert_eq!(BaseKey::new("1", "2"), r2.unwrap().key);
    }

    #[test]
    fn test_merge_row_results_with_errors() {
        let err: RowResult = Err(Error::new(ErrorKind::Other, "test error"));
        assert!(merge_row_results(row("1", 1, "x"), err).is_err());

        let err: RowResult = Err(Error::new(ErrorKind::Other, "test error"));
        assert!(merge_row_results(err, row("1", 1, "x")).is_err());
    }
}
