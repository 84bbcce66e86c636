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

//! In-memory base and view storage.
//!
//! The base table keeps a mutable top [`Level`] and a stack of frozen [`Immutable`] levels
//! standing for persisted segments. Reads merge all levels, so a row reads the same whether
//! its fragments are still staged or already flushed.

pub mod api;
pub mod base_table;
pub mod compact;
pub mod covering;
pub mod immutable;
pub mod level;
pub mod view_table;

pub use self::api::BaseTableApi;
pub use self::api::BaseTableRO;
pub use self::api::FragmentsRO;
pub use self::api::ViewWriteApi;
pub use self::base_table::BaseTable;
pub use self::covering::CoveringDeletions;
pub use self::immutable::Immutable;
pub use self::level::Level;
pub use self::view_table::ViewTable;
pub use self::view_table::ViewTables;
