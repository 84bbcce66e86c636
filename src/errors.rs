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

use std::io;

use crate::row::BaseKey;

/// Contract violations detected while computing view updates for one base row.
///
/// These abort the update of that single row; they are never retried.
#[derive(Clone, PartialEq, Eq, thiserror::Error, Debug)]
pub enum ViewUpdateError {
    /// The two snapshots (or a snapshot and a mutation) do not describe the same base row.
    #[error("KeyMismatch: before={before} after={after}")]
    KeyMismatch { before: BaseKey, after: BaseKey },

    /// A base row carries a column the view's base schema does not define.
    #[error("UnknownColumn: view={view} column={column}")]
    UnknownColumn { view: String, column: String },
}

impl From<ViewUpdateError> for io::Error {
    fn from(e: ViewUpdateError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}

/// Errors returned by [`ViewUpdateEngine`](crate::engine::ViewUpdateEngine).
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    ViewUpdate(#[from] ViewUpdateError),
}
