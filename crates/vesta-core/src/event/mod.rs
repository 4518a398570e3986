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

//! Synchronous event notification primitives.
//!
//! The primary component is the [`Emitter`], which owns an ordered list of
//! weakly-referenced subscribers for one event category and dispatches calls
//! to them on the emitting thread. Subscribers implement the category trait
//! (a trait extending [`Receiver`]) and may freely connect, disconnect, or
//! trigger further emissions from inside their own handlers; the emitter's
//! bookkeeping is guarded against that reentrancy.
//!
//! By keeping the primitive generic over the category trait, `vesta-core`
//! lets higher-level crates declare their own callback interfaces without
//! creating circular dependencies.

mod emitter;
mod receiver;

pub use self::emitter::Emitter;
pub use self::receiver::{EmitterHandle, EmitterId, Receiver};
