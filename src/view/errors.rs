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

/// Errors that can occur when a view definition is built against a base schema.
#[derive(Clone, PartialEq, Eq, thiserror::Error, Debug)]
pub enum ViewDefinitionError {
    /// A selected column is not a regular column of the base table.
    #[error("UnknownColumn: view={view} column={column} is not a regular column of the base table")]
    UnknownColumn { view: String, column: String },

    /// Only a non-key base column can be promoted into the view key.
    #[error("PromotedNotRegular: view={view} column={column} can not be promoted into the view key")]
    PromotedNotRegular { view: String, column: String },

    /// A view key holds at most one column that is not part of the base key.
    #[error("MultiplePromoted: view={view} already promotes {first}, can not promote {second}")]
    MultiplePromoted {
        view: String,
        first: String,
        second: String,
    },
}
