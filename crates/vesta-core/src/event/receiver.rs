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

//! Receiver capability and emitter identity types.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique runtime handle identifying one [`Emitter`](super::Emitter)
/// instance.
///
/// Ids are process-wide unique and never reused, so a receiver can use them
/// to tell apart the emitters it is attached to — including a source and
/// destination pair during a subscription transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(u64);

impl EmitterId {
    pub(crate) fn next() -> Self {
        static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-erased view of an [`Emitter`](super::Emitter) handed to receiver
/// lifecycle hooks.
///
/// The erased form keeps [`Receiver`] declarable as a plain supertrait of
/// every event category. A receiver that needs the concrete emitter can
/// recover it through [`as_any`](EmitterHandle::as_any):
///
/// ```ignore
/// let emitter = handle.as_any().downcast_ref::<Emitter<dyn DeviceEvents>>();
/// ```
pub trait EmitterHandle {
    /// Stable identity of the notifying emitter.
    fn emitter_id(&self) -> EmitterId;

    /// Upcast for downcasting to the concrete `Emitter<E>`.
    fn as_any(&self) -> &dyn Any;
}

/// Capability implemented by everything that can be connected to an
/// [`Emitter`](super::Emitter).
///
/// Event category traits extend this trait with their call signatures:
///
/// ```
/// use vesta_core::event::Receiver;
///
/// trait DeviceEvents: Receiver {
///     fn on_device_removed(&self, _adapter_name: &str) {}
/// }
/// ```
///
/// Both hooks default to no-ops; receivers override them when they track
/// their own attachment state. The hooks fire synchronously on the thread
/// mutating the subscription — connect, disconnect, subscription copy or
/// transfer, and emitter destruction all notify through them.
pub trait Receiver: Send + Sync {
    /// Called right after this receiver is attached to `emitter`.
    fn on_connected(&self, _emitter: &dyn EmitterHandle) {}

    /// Called right after this receiver is detached from `emitter`.
    ///
    /// Only fires for receivers that were part of the emitter's delivered
    /// set; a connection both made and withdrawn inside a single emission
    /// cycle is dissolved silently.
    fn on_disconnected(&self, _emitter: &dyn EmitterHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitter_ids_are_unique_and_monotonic() {
        let first = EmitterId::next();
        let second = EmitterId::next();
        assert_ne!(first, second, "consecutive ids must differ");
    }

    #[test]
    fn emitter_id_displays_as_plain_number() {
        let id = EmitterId(42);
        assert_eq!(id.to_string(), "42");
    }
}
