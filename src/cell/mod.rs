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

//! Defines [`Cell`], the timestamped unit of column data.
//!
//! Every column value carries its own write timestamp and an optional expiration.
//! A cell without a value is a tombstone. Row-level existence is tracked separately
//! by [`LivenessInfo`], and row-level deletions by [`Deletion`].

mod deletion;
mod liveness;

use serde::Deserialize;
use serde::Serialize;

pub use self::deletion::Deletion;
pub use self::liveness::LivenessInfo;
use crate::Timestamp;
use crate::Value;

/// Expiration of data written with a TTL.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Expiry {
    /// The TTL in seconds, as written.
    pub ttl: u32,

    /// The reference time in seconds at which the data stops being live.
    pub local_deletion_time: i64,
}

impl Expiry {
    /// Build an expiry for data written at reference time `now` with `ttl` seconds to live.
    pub fn new(ttl: u32, now: i64) -> Self {
        Self {
            ttl,
            local_deletion_time: now.saturating_add(ttl as i64),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.local_deletion_time <= now
    }
}

/// A versioned column value.
///
/// A cell is live at reference time `now` iff it has a value and it has no expiry or
/// its expiry lies after `now`. A cell with a value but an elapsed TTL is logically a
/// tombstone at `now`, but it keeps its value for reconciliation.
///
/// # Examples
///
/// ```
/// use view_update::cell::Cell;
///
/// let written = Cell::new(10, b"1".to_vec());
/// let deleted = Cell::tombstone(10);
///
/// // A deletion dominates a write with the same timestamp.
/// assert_eq!(Cell::reconcile(written, deleted.clone()), deleted);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub timestamp: Timestamp,

    /// `None` for a tombstone.
    pub value: Option<Value>,

    pub expiry: Option<Expiry>,
}

/// Total order used to decide which of two cells of the same column wins.
///
/// Fields compare in declaration order:
/// a later timestamp wins; at equal timestamp a tombstone wins;
/// between values, a non-expiring cell beats an expiring one,
/// then the later expiration wins, then the greater value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellOrder<'a> {
    timestamp: Timestamp,
    tombstone: bool,
    non_expiring: bool,
    local_deletion_time: i64,
    ttl: u32,
    value: &'a [u8],
}

impl Cell {
    pub fn new(timestamp: Timestamp, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: Some(value.into()),
            expiry: None,
        }
    }

    pub fn tombstone(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            value: None,
            expiry: None,
        }
    }

    /// Attach an expiry to a value cell. Tombstones never expire.
    pub fn with_expiry(mut self, expiry: Option<Expiry>) -> Self {
        if self.value.is_some() {
            self.expiry = expiry;
        }
        self
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_live(&self, now: i64) -> bool {
        self.value.is_some() && !self.expiry.is_some_and(|e| e.is_expired(now))
    }

    /// Return the value if the cell is live at `now`.
    pub fn live_value(&self, now: i64) -> Option<&Value> {
        if self.is_live(now) {
            self.value.as_ref()
        } else {
            None
        }
    }

    pub fn order_key(&self) -> CellOrder<'_> {
        CellOrder {
            timestamp: self.timestamp,
            tombstone: self.is_tombstone(),
            non_expiring: self.expiry.is_none(),
            local_deletion_time: self.expiry.map_or(i64::MAX, |e| e.local_deletion_time),
            ttl: self.expiry.map_or(0, |e| e.ttl),
            value: self.value.as_deref().unwrap_or_default(),
        }
    }

    /// Return the winner of two cells of the same column.
    pub fn reconcile(a: Self, b: Self) -> Self {
        if b.order_key() > a.order_key() {
            b
        } else {
            a
        }
    }

    pub fn reconcile_ref<'l>(a: &'l Self, b: &'l Self) -> &'l Self {
        if b.order_key() > a.order_key() {
            b
        } else {
            a
        }
    }

    /// A copy that keeps only the liveness-relevant part: timestamp and expiry.
    ///
    /// Used for base columns a view tracks for existence but does not return.
    pub fn to_virtual(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            value: self.value.as_ref().map(|_| Value::new()),
            expiry: self.expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn b(x: impl ToString) -> Vec<u8> {
        x.to_string().into_bytes()
    }

    #[test]
    fn test_cell_liveness() {
        assert!(Cell::new(1, b("a")).is_live(100));
        assert!(!Cell::tombstone(1).is_live(100));

        let c = Cell::new(1, b("a")).with_expiry(Some(Expiry::new(3, 100)));
        assert!(c.is_live(100));
        assert!(c.is_live(102));
        assert!(!c.is_live(103), "expired at local_deletion_time");
        assert_eq!(None, c.live_value(104));
        assert_eq!(Some(&b("a")), c.live_value(101));
    }

    #[test]
    fn test_expiry_far_future_now() {
        let e = Expiry::new(u32::MAX, i64::MAX - 1);
        assert_eq!(i64::MAX, e.local_deletion_time);
        assert!(!e.is_expired(i64::MAX - 1));

        let c = Cell::new(1, b("a")).with_expiry(Some(Expiry::new(3, i64::MAX)));
        assert!(!c.is_live(i64::MAX));
    }

    #[test]
    fn test_tombstone_has_no_expiry() {
        let t = Cell::tombstone(5).with_expiry(Some(Expiry::new(3, 100)));
        assert_eq!(Cell::tombstone(5), t);
    }

    #[test]
    fn test_reconcile_timestamp_wins() {
        assert_eq!(
            Cell::new(2, b("x")),
            Cell::reconcile(Cell::new(2, b("x")), Cell::tombstone(1))
        );
        assert_eq!(
            Cell::tombstone(3),
            Cell::reconcile(Cell::new(2, b("x")), Cell::tombstone(3))
        );
    }

    #[test]
    fn test_reconcile_tombstone_wins_equal_timestamp() {
        assert_eq!(
            Cell::tombstone(18),
            Cell::reconcile(Cell::new(18, b("1")), Cell::tombstone(18))
        );
        assert_eq!(
            Cell::tombstone(18),
            Cell::reconcile(Cell::tombstone(18), Cell::new(18, b("1")))
        );
    }

    #[test]
    fn test_reconcile_equal_timestamp_values() {
        let expiring = Cell::new(5, b("z")).with_expiry(Some(Expiry::new(3, 100)));
        let permanent = Cell::new(5, b("a"));

        // Non-expiring beats expiring, regardless of argument order.
        assert_eq!(
            permanent,
            Cell::reconcile(expiring.clone(), permanent.clone())
        );
        assert_eq!(
            permanent,
            Cell::reconcile(permanent.clone(), expiring.clone())
        );

        let later = Cell::new(5, b("a")).with_expiry(Some(Expiry::new(10, 100)));
        assert_eq!(later, Cell::reconcile(expiring.clone(), later.clone()));

        // Last resort: the greater value.
        assert_eq!(
            Cell::new(5, b("b")),
            Cell::reconcile(Cell::new(5, b("b")), Cell::new(5, b("a")))
        );
        assert_eq!(
            &Cell::new(5, b("b")),
            Cell::reconcile_ref(&Cell::new(5, b("a")), &Cell::new(5, b("b")))
        );
    }

    #[test]
    fn test_to_virtual() {
        let c = Cell::new(7, b("payload")).with_expiry(Some(Expiry::new(3, 100)));
        let v = c.to_virtual();

        assert_eq!(Some(vec![]), v.value);
        assert_eq!(7, v.timestamp);
        assert_eq!(c.expiry, v.expiry);
        assert_eq!(c.is_live(101), v.is_live(101));
        assert_eq!(c.is_live(103), v.is_live(103));

        assert_eq!(Cell::tombstone(7), Cell::tombstone(7).to_virtual());
    }

    #[test]
    fn test_cell_serde() -> anyhow::Result<()> {
        let c = Cell::new(7, b("v")).with_expiry(Some(Expiry::new(3, 100)));
        let s = serde_json::to_string(&c)?;
        let got: Cell = serde_json::from_str(&s)?;
        assert_eq!(c, got);
        Ok(())
    }
}
