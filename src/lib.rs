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

//! # View Update
//!
//! Computes the updates a materialized view needs when its base table is mutated,
//! for a table store where every cell carries a write timestamp and an optional TTL.
//!
//! Given the state of a base row before and after a mutation, the engine decides whether
//! the row maps to a view row in each state, and emits the minimal set of
//! [`MutationIntent`]s that keeps the view consistent with the base table under
//! last-write-wins reconciliation, no matter in which order or how many times the
//! intents are applied.
//!
//! ## Core Components
//!
//! - [`BaseRow`], [`Cell`], [`LivenessInfo`], [`Deletion`]: the timestamped data model
//! - [`ViewDefinition`]: selected columns and an optional promoted column
//! - [`diff()`]: the per-column and row-marker delta between two snapshots
//! - [`builder::generate`]: view intents for a single-row mutation
//! - [`handle_range_delete`]: view intents for range and partition deletions
//! - [`ViewUpdateEngine`]: drives a mutation through all of the above
//!
//! ## Usage Example
//!
//! ```rust
//! use std::io;
//! use std::sync::Arc;
//!
//! use view_update::mutation::RowUpdate;
//! use view_update::row::BaseKey;
//! use view_update::storage::BaseTable;
//! use view_update::storage::ViewTables;
//! use view_update::BaseSchema;
//! use view_update::EngineConfig;
//! use view_update::ViewDefinition;
//! use view_update::ViewUpdateEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let schema = Arc::new(BaseSchema::new("t", "k").with_regular(["a", "b"]));
//!     let mv = Arc::new(ViewDefinition::builder("mv", schema).select(["a"]).build()?);
//!
//!     let mut views = ViewTables::new();
//!     views.add(mv.clone());
//!
//!     let engine =
//!         ViewUpdateEngine::new(BaseTable::new(), views, EngineConfig::default()).with_view(mv);
//!
//!     let key = BaseKey::partition_only("1");
//!     let updates = engine
//!         .apply(RowUpdate::insert(key, 10).set("a", "x").build(), 1000)
//!         .await?;
//!     assert_eq!(1, updates.len());
//!
//!     Ok(())
//! }
//! ```

use std::io;

use futures_util::stream::BoxStream;

pub mod builder;
pub mod cell;
pub mod config;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod existence;
pub mod intent;
pub mod mutation;
pub mod range_delete;
pub mod row;
pub mod sequencer;
pub mod storage;
pub mod util;
pub mod view;


pub use crate::cell::Cell;
pub use crate::cell::Deletion;
pub use crate::cell::Expiry;
pub use crate::cell::LivenessInfo;
pub use crate::config::EngineConfig;
pub use crate::diff::diff;
pub use crate::diff::RowDelta;
pub use crate::engine::ViewUpdateEngine;
pub use crate::errors::EngineError;
pub use crate::errors::ViewUpdateError;
pub use crate::existence::ViewRowIdentity;
pub use crate::intent::MutationIntent;
pub use crate::intent::RowDeletionKind;
pub use crate::intent::ViewUpdate;
pub use crate::mutation::BaseMutation;
pub use crate::range_delete::handle_range_delete;
pub use crate::row::BaseKey;
pub use crate::row::BaseRow;
pub use crate::view::BaseSchema;
pub use crate::view::ViewDefinition;

/// Write timestamp of a cell, a row marker or a deletion. Larger is newer.
pub type Timestamp = i64;

/// Raw bytes of a key or a column value.
pub type Value = Vec<u8>;

/// A boxed stream that yields `Result` of items or an `io::Error`.
/// The stream is 'static to ensure it can live for the entire duration of the program.
pub type IOResultStream<T> = BoxStream<'static, Result<T, io::Error>>;

/// A stream of base rows returned by `range()`.
pub type RowResultStream = IOResultStream<BaseRow>;
