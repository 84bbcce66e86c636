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

use serde::Deserialize;
use serde::Serialize;

use crate::cell::Expiry;
use crate::Timestamp;

/// The row marker: existence of a row independent of its columns.
///
/// A base row gets a `Live` marker only from a row-creating write (an insert).
/// Rows touched only by column writes have no marker at all.
///
/// `Withdrawn` appears only in view rows. It suppresses markers with a timestamp
/// not greater than its own, and leaves the cells of the row alone.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessInfo {
    Live {
        timestamp: Timestamp,
        expiry: Option<Expiry>,
    },

    Withdrawn { timestamp: Timestamp },
}

impl LivenessInfo {
    pub fn live(timestamp: Timestamp) -> Self {
        LivenessInfo::Live {
            timestamp,
            expiry: None,
        }
    }

    pub fn expiring(timestamp: Timestamp, ttl: u32, now: i64) -> Self {
        LivenessInfo::Live {
            timestamp,
            expiry: Some(Expiry::new(ttl, now)),
        }
    }

    pub fn withdrawn(timestamp: Timestamp) -> Self {
        LivenessInfo::Withdrawn { timestamp }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            LivenessInfo::Live { timestamp, .. } => *timestamp,
            LivenessInfo::Withdrawn { timestamp } => *timestamp,
        }
    }

    pub fn expiry(&self) -> Option<Expiry> {
        match self {
            LivenessInfo::Live { expiry, .. } => *expiry,
            LivenessInfo::Withdrawn { .. } => None,
        }
    }

    pub fn is_withdrawn(&self) -> bool {
        matches!(self, LivenessInfo::Withdrawn { .. })
    }

    pub fn is_live(&self, now: i64) -> bool {
        match self {
            LivenessInfo::Live { expiry, .. } => !expiry.is_some_and(|e| e.is_expired(now)),
            LivenessInfo::Withdrawn { .. } => false,
        }
    }

    /// Same rules as cells: later timestamp wins, then withdrawal, then the longer-living marker.
    fn order_key(&self) -> (Timestamp, bool, bool, i64, u32) {
        let expiry = self.expiry();
        (
            self.timestamp(),
            self.is_withdrawn(),
            expiry.is_none(),
            expiry.map_or(i64::MAX, |e| e.local_deletion_time),
            expiry.map_or(0, |e| e.ttl),
        )
    }

    pub fn reconcile(a: Self, b: Self) -> Self {
        if b.order_key() > a.order_key() {
            b
        } else {
            a
        }
    }

    /// Reconcile two optional markers, an absent marker loses to any present one.
    pub fn reconcile_opt(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Self::reconcile(a, b)),
            (a, b) => a.or(b),
        }
    }
}
