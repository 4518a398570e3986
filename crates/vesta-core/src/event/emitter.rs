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

//! The emitter engine: subscription bookkeeping and synchronous dispatch.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::ptr;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use super::receiver::{EmitterHandle, EmitterId, Receiver};

/// Subscription state of one emitter.
///
/// `main` is the delivery-ordered subscriber list; a `None` slot is a
/// tombstone left by a disconnect that happened while an emission was
/// iterating the list. `staged` collects connections made during an active
/// emission; it is merged to the end of `main` when the outermost emission
/// completes.
struct SubscriberList<E: ?Sized> {
    main: Vec<Option<Weak<E>>>,
    staged: Vec<Weak<E>>,
    emitting: bool,
    needs_compaction: bool,
}

impl<E: ?Sized> Default for SubscriberList<E> {
    fn default() -> Self {
        Self {
            main: Vec::new(),
            staged: Vec::new(),
            emitting: false,
            needs_compaction: false,
        }
    }
}

fn receiver_key<E: ?Sized>(receiver: &Arc<E>) -> *const () {
    Arc::as_ptr(receiver).cast()
}

fn slot_key<E: ?Sized>(weak: &Weak<E>) -> *const () {
    weak.as_ptr().cast()
}

impl<E: ?Sized> SubscriberList<E> {
    /// Index of `key` in the main list. Dead and tombstoned slots never
    /// match: a dropped receiver's address may already belong to someone
    /// else.
    fn position_in_main(&self, key: *const ()) -> Option<usize> {
        self.main.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|weak| weak.strong_count() > 0 && slot_key(weak) == key)
        })
    }

    fn position_in_staged(&self, key: *const ()) -> Option<usize> {
        self.staged
            .iter()
            .position(|weak| weak.strong_count() > 0 && slot_key(weak) == key)
    }

    fn live_count(&self) -> usize {
        let main = self
            .main
            .iter()
            .flatten()
            .filter(|weak| weak.strong_count() > 0)
            .count();
        let staged = self
            .staged
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count();
        main + staged
    }
}

/// Restores emission bookkeeping when a dispatch pass unwinds, normally or
/// through a receiver panic.
///
/// The outermost scope merges staged connections into the main list and
/// purges tombstones; nested scopes only restore the emitting flag, so every
/// in-flight pass keeps iterating stable indices.
struct EmitScope<'a, E: ?Sized> {
    list: &'a RefCell<SubscriberList<E>>,
    was_emitting: bool,
}

impl<E: ?Sized> Drop for EmitScope<'_, E> {
    fn drop(&mut self) {
        let mut list = self.list.borrow_mut();
        list.emitting = self.was_emitting;
        if self.was_emitting {
            return;
        }
        if !list.staged.is_empty() {
            let staged = mem::take(&mut list.staged);
            list.main.extend(staged.into_iter().map(Some));
        }
        if list.needs_compaction {
            list.main.retain(Option::is_some);
            list.needs_compaction = false;
        }
    }
}

/// Owner of the subscriber list for one event category `E`, and the source
/// of synchronous dispatch to those subscribers.
///
/// `E` is the unsized category trait object (e.g. `dyn ObjectEvents`), whose
/// trait must extend [`Receiver`]. Domain objects embed an emitter per
/// category they notify about and dispatch through [`emit`](Emitter::emit):
///
/// ```
/// use std::sync::Arc;
/// use vesta_core::event::{Emitter, Receiver};
///
/// trait FrameEvents: Receiver {
///     fn on_frame_presented(&self, _frame_index: u64) {}
/// }
///
/// struct FrameCounter;
/// impl Receiver for FrameCounter {}
/// impl FrameEvents for FrameCounter {}
///
/// let emitter: Emitter<dyn FrameEvents> = Emitter::new();
/// let counter: Arc<dyn FrameEvents> = Arc::new(FrameCounter);
/// emitter.connect(&counter);
/// emitter.emit(|receiver| receiver.on_frame_presented(1));
/// ```
///
/// # Reentrancy
///
/// All operations are guarded by one same-thread-recursive lock, so a
/// receiver handler running under an in-progress [`emit`](Emitter::emit) may
/// connect, disconnect, or emit again on the same emitter without deadlock
/// and without corrupting the subscription list:
///
/// - a connect made during an emission is staged and joins the main list
///   only once the outermost emission completes — the new receiver is never
///   called by the in-progress emission;
/// - a disconnect made during an emission tombstones the slot in place, so
///   the disconnected receiver is skipped for the rest of the pass and the
///   slot is purged afterwards;
/// - a nested emission first delivers to staged-but-unmerged receivers,
///   then runs the same main list the outer emission is iterating.
///
/// Across threads, operations on one emitter are mutually exclusive; two
/// threads never dispatch concurrently through the same subscriber list.
///
/// # Panics
///
/// A panic raised by a receiver handler aborts the remaining dispatch of
/// that emission and propagates to the caller — no handler isolation is
/// provided. The subscription bookkeeping itself is restored on unwind, so
/// the emitter stays usable if the panic is caught.
pub struct Emitter<E: ?Sized + Receiver + 'static> {
    id: EmitterId,
    subscribers: ReentrantMutex<RefCell<SubscriberList<E>>>,
}

impl<E: ?Sized + Receiver + 'static> Emitter<E> {
    /// Creates an emitter with no subscribers.
    pub fn new() -> Self {
        Self {
            id: EmitterId::next(),
            subscribers: ReentrantMutex::new(RefCell::new(SubscriberList::default())),
        }
    }

    /// Returns this emitter's unique runtime identity.
    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Attaches `receiver` to this emitter.
    ///
    /// Idempotent: a receiver already subscribed (including one staged by
    /// the current emission) is left untouched and receives no notification.
    /// On actual insertion the receiver is synchronously notified via
    /// [`Receiver::on_connected`]. No previously emitted event is replayed.
    ///
    /// If this emitter is currently emitting, the new subscription is staged
    /// and will not be called by the in-progress emission; it becomes part
    /// of the delivery order once the outermost emission completes.
    pub fn connect(&self, receiver: &Arc<E>) {
        let guard = self.subscribers.lock();
        let inserted = {
            let mut list = guard.borrow_mut();
            let key = receiver_key(receiver);
            if list.position_in_main(key).is_some() || list.position_in_staged(key).is_some() {
                false
            } else if list.emitting {
                list.staged.push(Arc::downgrade(receiver));
                true
            } else {
                list.main.push(Some(Arc::downgrade(receiver)));
                true
            }
        };
        if inserted {
            log::trace!("Receiver connected to emitter {}", self.id);
            receiver.on_connected(self);
        }
    }

    /// Detaches `receiver` from this emitter.
    ///
    /// A receiver found in the main list is removed (tombstoned while an
    /// emission is in progress, physically erased otherwise) and then
    /// synchronously notified via [`Receiver::on_disconnected`]. A receiver
    /// that was only staged by the current emission is removed silently —
    /// it was never part of a delivered set, so the notification count
    /// keeps matching the delivery count. Disconnecting an unknown receiver
    /// is a no-op.
    pub fn disconnect(&self, receiver: &Arc<E>) {
        let guard = self.subscribers.lock();
        let removed_from_main = {
            let mut list = guard.borrow_mut();
            let key = receiver_key(receiver);
            if let Some(index) = list.position_in_main(key) {
                if list.emitting {
                    list.main[index] = None;
                    list.needs_compaction = true;
                } else {
                    list.main.remove(index);
                }
                true
            } else {
                if let Some(index) = list.position_in_staged(key) {
                    list.staged.remove(index);
                }
                false
            }
        };
        if removed_from_main {
            log::trace!("Receiver disconnected from emitter {}", self.id);
            receiver.on_disconnected(self);
        }
    }

    /// Returns `true` if `receiver` is subscribed, counting staged
    /// connections not yet merged into the delivery order.
    pub fn is_connected(&self, receiver: &Arc<E>) -> bool {
        let guard = self.subscribers.lock();
        let list = guard.borrow();
        let key = receiver_key(receiver);
        list.position_in_main(key).is_some() || list.position_in_staged(key).is_some()
    }

    /// Number of live subscribers, staged connections included.
    pub fn receiver_count(&self) -> usize {
        let guard = self.subscribers.lock();
        let list = guard.borrow();
        list.live_count()
    }

    /// Dispatches one call signature to every subscriber, synchronously and
    /// in subscription order.
    ///
    /// `call` is invoked once per live subscriber present in the main list
    /// when the emission begins. Receivers connected during this emission
    /// are deferred to the next one; receivers disconnected (or dropped)
    /// during it are skipped from that point on. A reentrant emission first
    /// delivers to receivers staged by the outer emission, then walks the
    /// same main list the outer emission is iterating.
    pub fn emit(&self, call: impl Fn(&E)) {
        let guard = self.subscribers.lock();

        // A non-empty staged list at this point means this emission was
        // raised from inside a handler of an outer one. Staged receivers
        // have not joined the delivery order yet but must still observe
        // events raised after their connection, so they are served first,
        // from a snapshot: handlers may stage further connections.
        let staged_snapshot: Vec<Weak<E>> = {
            let list = guard.borrow();
            if list.emitting && !list.staged.is_empty() {
                list.staged.clone()
            } else {
                Vec::new()
            }
        };
        for receiver in staged_snapshot.iter().filter_map(Weak::upgrade) {
            call(&receiver);
        }

        let was_emitting = {
            let mut list = guard.borrow_mut();
            mem::replace(&mut list.emitting, true)
        };
        let scope = EmitScope {
            list: &*guard,
            was_emitting,
        };

        // While the emitting flag is set the main list cannot change
        // length: connects are staged and disconnects tombstone in place.
        let count = scope.list.borrow().main.len();
        log::trace!("Emitter {} dispatching to {} slot(s)", self.id, count);
        for index in 0..count {
            let slot = scope.list.borrow().main[index].clone();
            let Some(weak) = slot else {
                continue; // tombstoned earlier in this emission cycle
            };
            let Some(receiver) = weak.upgrade() else {
                // Receiver dropped without disconnecting; purge the slot
                // once the outermost emission completes.
                let mut list = scope.list.borrow_mut();
                list.main[index] = None;
                list.needs_compaction = true;
                continue;
            };
            call(&receiver);
        }
    }

    /// Moves every subscription of `source` onto `self`.
    ///
    /// `self`'s pre-existing subscribers are disconnected (and notified)
    /// first. Each receiver moving over observes one
    /// [`on_disconnected`](Receiver::on_disconnected) from `source` followed
    /// by one [`on_connected`](Receiver::on_connected) from `self`, with no
    /// event delivered in between; `source` ends with zero subscribers.
    /// Transferring an emitter onto itself is a no-op.
    pub fn transfer_from(&self, source: &Emitter<E>) {
        if ptr::eq(self, source) {
            return;
        }
        log::trace!(
            "Transferring subscriptions from emitter {} to emitter {}",
            source.id,
            self.id
        );
        self.drain_connections();
        let transferred = source.drain_connections();
        self.install_connections(&transferred);
    }

    /// Disconnects every subscriber, notifying each in subscription order.
    ///
    /// The list is emptied before the callbacks run, so a handler probing
    /// this emitter observes no remaining subscribers. Returns the drained
    /// back-references.
    fn drain_connections(&self) -> Vec<Weak<E>> {
        let guard = self.subscribers.lock();
        let drained: Vec<Weak<E>> = {
            let mut list = guard.borrow_mut();
            debug_assert!(
                !list.emitting,
                "an emitter must not be drained while it is emitting"
            );
            list.needs_compaction = false;
            mem::take(&mut list.main).into_iter().flatten().collect()
        };
        for receiver in drained.iter().filter_map(Weak::upgrade) {
            receiver.on_disconnected(self);
        }
        drained
    }

    /// Installs `connections` as the main list and notifies each live
    /// receiver of its new attachment.
    fn install_connections(&self, connections: &[Weak<E>]) {
        let guard = self.subscribers.lock();
        {
            let mut list = guard.borrow_mut();
            list.main = connections.iter().cloned().map(Some).collect();
        }
        for receiver in connections.iter().filter_map(Weak::upgrade) {
            receiver.on_connected(self);
        }
    }

    /// Copies the live entries of the main list.
    fn snapshot_connections(&self) -> Vec<Weak<E>> {
        let guard = self.subscribers.lock();
        let list = guard.borrow();
        list.main
            .iter()
            .flatten()
            .filter(|weak| weak.strong_count() > 0)
            .cloned()
            .collect()
    }
}

impl<E: ?Sized + Receiver + 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Duplicates the subscriber list.
///
/// The clone gets its own identity and a copy of the source's current main
/// list; every copied receiver is synchronously notified
/// [`on_connected`](Receiver::on_connected) by the clone. The source emitter
/// and its subscriptions are unaffected. [`clone_from`](Clone::clone_from)
/// additionally disconnects (and notifies) the target's pre-existing
/// subscribers before installing the copy.
impl<E: ?Sized + Receiver + 'static> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        let duplicate = Self::new();
        duplicate.install_connections(&self.snapshot_connections());
        duplicate
    }

    fn clone_from(&mut self, source: &Self) {
        self.drain_connections();
        self.install_connections(&source.snapshot_connections());
    }
}

impl<E: ?Sized + Receiver + 'static> Drop for Emitter<E> {
    fn drop(&mut self) {
        self.drain_connections();
    }
}

impl<E: ?Sized + Receiver + 'static> EmitterHandle for Emitter<E> {
    fn emitter_id(&self) -> EmitterId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<E: ?Sized + Receiver + 'static> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
