// Copyright 2025 vesta
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

//! Named engine objects and their notification surface.
//!
//! Every engine-visible object carries a mutable debug name and notifies
//! interested parties of renames and releases through an embedded
//! [`Emitter`](crate::event::Emitter). The [`ObjectRegistry`] is the
//! canonical listener: an explicitly owned name lookup that keeps itself
//! consistent by subscribing to the objects it tracks.

mod named;
mod registry;

pub use self::named::{NamedObject, ObjectEvents};
pub use self::registry::{ObjectError, ObjectRegistry};
