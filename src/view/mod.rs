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

//! Static description of a base table and of the views defined on it.

mod definition;
pub mod errors;
mod schema;

pub use self::definition::ViewDefinition;
pub use self::definition::ViewDefinitionBuilder;
pub use self::errors::ViewDefinitionError;
pub use self::schema::BaseSchema;
