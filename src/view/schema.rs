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

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

/// Column layout of a base table.
///
/// Key column names are kept for reporting; key values live in [`BaseKey`](crate::row::BaseKey).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BaseSchema {
    pub table: String,
    pub partition_key: String,
    pub clustering_key: Option<String>,
    pub regular: BTreeSet<String>,
}

impl BaseSchema {
    pub fn new(table: impl ToString, partition_key: impl ToString) -> Self {
        Self {
            table: table.to_string(),
            partition_key: partition_key.to_string(),
            clustering_key: None,
            regular: BTreeSet::new(),
        }
    }

    pub fn with_clustering_key(mut self, column: impl ToString) -> Self {
        self.clustering_key = Some(column.to_string());
        self
    }

    pub fn with_regular<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.regular.extend(columns.into_iter().map(|c| c.to_string()));
        self
    }

    pub fn is_regular(&self, column: &str) -> bool {
        self.regular.contains(column)
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.partition_key == column || self.clustering_key.as_deref() == Some(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_schema() {
        let s = BaseSchema::new("t", "k")
            .with_clustering_key("c")
            .with_regular(["a", "b"]);

        assert!(s.is_key("k"));
        assert!(s.is_key("c"));
        assert!(!s.is_key("a"));
        assert!(s.is_regular("a"));
        assert!(!s.is_regular("k"));
        assert!(!s.is_regular("z"));
    }
}
