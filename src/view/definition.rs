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
use std::sync::Arc;

use crate::errors::ViewUpdateError;
use crate::row::BaseRow;
use crate::view::BaseSchema;
use crate::view::ViewDefinitionError;

/// A materialized view over a base table.
///
/// The view key is the base key, optionally extended with one **promoted** regular column.
///
/// - With a promoted column the view uses *strict liveness*: a view row exists iff the
///   promoted column is live in the base row. The view row marker is derived from the
///   promoted cell.
/// - Without one, a view row exists iff the base row is present. Every regular column
///   contributes to that, so unselected columns are tracked as *virtual* cells: timestamp
///   and expiry only, never returned by reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    name: String,
    schema: Arc<BaseSchema>,
    selected: BTreeSet<String>,
    promoted: Option<String>,
}

impl ViewDefinition {
    pub fn builder(name: impl ToString, schema: Arc<BaseSchema>) -> ViewDefinitionBuilder {
        ViewDefinitionBuilder {
            name: name.to_string(),
            schema,
            selected: BTreeSet::new(),
            promoted: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<BaseSchema> {
        &self.schema
    }

    /// Regular columns returned by the view.
    /// The promoted column is part of the key, not listed here.
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn promoted(&self) -> Option<&str> {
        self.promoted.as_deref()
    }

    pub fn is_strict(&self) -> bool {
        self.promoted.is_some()
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected.contains(column)
    }

    /// Whether changes of a base column are propagated to view rows.
    pub fn tracks(&self, column: &str) -> bool {
        match &self.promoted {
            Some(p) => p != column && self.selected.contains(column),
            None => self.schema.is_regular(column),
        }
    }

    /// A tracked column that only contributes to the existence of a view row.
    pub fn is_virtual(&self, column: &str) -> bool {
        self.tracks(column) && !self.selected.contains(column)
    }

    /// Check that every column written in `row` belongs to the base table.
    pub fn check_row(&self, row: &BaseRow) -> Result<(), ViewUpdateError> {
        match row.cells.keys().find(|c| !self.schema.is_regular(c)) {
            None => Ok(()),
            Some(column) => Err(ViewUpdateError::UnknownColumn {
                view: self.name.clone(),
                column: column.clone(),
            }),
        }
    }
}

/// Builds a [`ViewDefinition`] and validates it against the base schema.
#[derive(Debug, Clone)]
pub struct ViewDefinitionBuilder {
    name: String,
    schema: Arc<BaseSchema>,
    selected: BTreeSet<String>,
    promoted: Vec<String>,
}

impl ViewDefinitionBuilder {
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.selected
            .extend(columns.into_iter().map(|c| c.to_string()));
        self
    }

    /// Select every regular column of the base table.
    pub fn select_all(mut self) -> Self {
        self.selected.extend(self.schema.regular.iter().cloned());
        self
    }

    /// Add a regular column to the view key.
    pub fn promote(mut self, column: impl ToString) -> Self {
        self.promoted.push(column.to_string());
        self
    }

    pub fn build(self) -> Result<ViewDefinition, ViewDefinitionError> {
        let name = self.name;

        if let Some(column) = self.selected.iter().find(|c| !self.schema.is_regular(c)) {
            return Err(ViewDefinitionError::UnknownColumn {
                view: name,
                column: column.clone(),
            });
        }

        if let [first, second, ..] = self.promoted.as_slice() {
            return Err(ViewDefinitionError::MultiplePromoted {
                view: name,
                first: first.clone(),
                second: second.clone(),
            });
        }

        let promoted = self.promoted.into_iter().next();

        if let Some(p) = &promoted {
            if !self.schema.is_regular(p) {
                return Err(ViewDefinitionError::PromotedNotRegular {
                    view: name,
                    column: p.clone(),
                });
            }
        }

        let mut selected = self.selected;
        if let Some(p) = &promoted {
            selected.remove(p);
        }

        Ok(ViewDefinition {
            name,
            schema: self.schema,
            selected,
            promoted,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cell::Cell;
    use crate::row::BaseKey;

    fn schema() -> Arc<BaseSchema> {
        Arc::new(
            BaseSchema::new("t", "k")
                .with_clustering_key("c")
                .with_regular(["a", "b", "e", "f"]),
        )
    }

    #[test]
    fn test_non_strict_view_tracks_all_regular_columns() -> anyhow::Result<()> {
        let v = ViewDefinition::builder("mv", schema())
            .select(["a", "b"])
            .build()?;

        assert_eq!("mv", v.name());
        assert!(!v.is_strict());
        assert!(v.tracks("a"));
        assert!(v.tracks("e"));
        assert!(!v.tracks("k"));
        assert!(!v.is_virtual("a"));
        assert!(v.is_virtual("f"));
        Ok(())
    }

    #[test]
    fn test_strict_view() -> anyhow::Result<()> {
        let v = ViewDefinition::builder("mv", schema())
            .select_all()
            .promote("b")
            .build()?;

        assert!(v.is_strict());
        assert_eq!(Some("b"), v.promoted());
        assert_eq!(
            ["a", "e", "f"].map(String::from).into_iter().collect::<BTreeSet<_>>(),
            v.selected().clone()
        );
        assert!(!v.tracks("b"));
        assert!(v.tracks("a"));
        assert!(!v.is_virtual("a"));
        Ok(())
    }

    #[test]
    fn test_strict_view_tracks_only_selected() -> anyhow::Result<()> {
        let v = ViewDefinition::builder("mv", schema())
            .select(["a"])
            .promote("b")
            .build()?;

        assert!(v.tracks("a"));
        assert!(!v.tracks("e"));
        Ok(())
    }

    #[test]
    fn test_build_errors() {
        let got = ViewDefinition::builder("mv", schema()).select(["z"]).build();
        assert_eq!(
            Err(ViewDefinitionError::UnknownColumn {
                view: "mv".to_string(),
                column: "z".to_string(),
            }),
            got
        );

        let got = ViewDefinition::builder("mv", schema()).promote("c").build();
        assert_eq!(
            Err(ViewDefinitionError::PromotedNotRegular {
                view: "mv".to_string(),
                column: "c".to_string(),
            }),
            got
        );

        let got = ViewDefinition::builder("mv", schema())
            .promote("a")
            .promote("b")
            .build();
        assert_eq!(
            Err(ViewDefinitionError::MultiplePromoted {
                view: "mv".to_string(),
                first: "a".to_string(),
                second: "b".to_string(),
            }),
            got
        );
    }

    #[test]
    fn test_check_row() -> anyhow::Result<()> {
        let v = ViewDefinition::builder("mv", schema()).select(["a"]).build()?;

        let row = BaseRow::new(BaseKey::new("1", "1")).with_cell("a", Cell::new(1, "1"));
        assert_eq!(Ok(()), v.check_row(&row));

        let row = row.with_cell("zz", Cell::new(1, "1"));
        assert_eq!(
            Err(ViewUpdateError::UnknownColumn {
                view: "mv".to_string(),
                column: "zz".to_string(),
            }),
            v.check_row(&row)
        );
        Ok(())
    }
}
