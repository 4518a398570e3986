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

use std::fmt;
use std::sync::Mutex;

use crate::event::{Emitter, Receiver};

/// Event category for named-object lifecycle notifications.
pub trait ObjectEvents: Receiver {
    /// The object's debug name changed from `old_name` to `new_name`.
    fn on_object_name_changed(&self, _old_name: &str, _new_name: &str) {}

    /// The object is being released; `name` is its final debug name.
    fn on_object_released(&self, _name: &str) {}
}

/// An engine-visible object with a mutable debug name.
///
/// Renames and the final release are announced through the embedded
/// [`Emitter`]; listeners attach via [`events`](NamedObject::events).
pub struct NamedObject {
    name: Mutex<String>,
    events: Emitter<dyn ObjectEvents>,
}

impl NamedObject {
    /// Creates an object with the given debug name and no listeners.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Mutex::new(name.into()),
            events: Emitter::new(),
        }
    }

    /// Current debug name.
    pub fn name(&self) -> String {
        self.name.lock().unwrap().clone()
    }

    /// Renames the object, announcing the change to every listener.
    ///
    /// Returns `false` (and emits nothing) when `name` equals the current
    /// name.
    pub fn set_name(&self, name: impl Into<String>) -> bool {
        let new_name = name.into();
        let old_name = {
            let mut current = self.name.lock().unwrap();
            if *current == new_name {
                return false;
            }
            std::mem::replace(&mut *current, new_name.clone())
        };
        log::debug!("Object \"{old_name}\" renamed to \"{new_name}\"");
        self.events
            .emit(|receiver| receiver.on_object_name_changed(&old_name, &new_name));
        true
    }

    /// Emitter carrying this object's lifecycle notifications.
    pub fn events(&self) -> &Emitter<dyn ObjectEvents> {
        &self.events
    }
}

impl Drop for NamedObject {
    fn drop(&mut self) {
        let name = self.name.get_mut().unwrap().clone();
        self.events
            .emit(|receiver| receiver.on_object_released(&name));
    }
}

impl fmt::Debug for NamedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedObject")
            .field("name", &*self.name.lock().unwrap())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct RenameWatcher {
        renames: Mutex<Vec<(String, String)>>,
        releases: AtomicUsize,
    }

    impl Receiver for RenameWatcher {}

    impl ObjectEvents for RenameWatcher {
        fn on_object_name_changed(&self, old_name: &str, new_name: &str) {
            self.renames
                .lock()
                .unwrap()
                .push((old_name.to_owned(), new_name.to_owned()));
        }

        fn on_object_released(&self, _name: &str) {
            self.releases.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn rename_announces_old_and_new_names() {
        let object = NamedObject::new("Quad Mesh");
        let watcher = Arc::new(RenameWatcher::default());
        object.events().connect(&(watcher.clone() as Arc<dyn ObjectEvents>));

        assert!(object.set_name("Sky Quad"));
        assert_eq!(object.name(), "Sky Quad");
        assert_eq!(
            watcher.renames.lock().unwrap().as_slice(),
            &[("Quad Mesh".to_owned(), "Sky Quad".to_owned())]
        );
    }

    #[test]
    fn renaming_to_the_same_name_is_silent() {
        let object = NamedObject::new("Depth Buffer");
        let watcher = Arc::new(RenameWatcher::default());
        object.events().connect(&(watcher.clone() as Arc<dyn ObjectEvents>));

        assert!(!object.set_name("Depth Buffer"));
        assert!(watcher.renames.lock().unwrap().is_empty());
    }

    #[test]
    fn dropping_the_object_announces_release() {
        let watcher = Arc::new(RenameWatcher::default());
        {
            let object = NamedObject::new("Transient Target");
            object.events().connect(&(watcher.clone() as Arc<dyn ObjectEvents>));
        }
        assert_eq!(watcher.releases.load(Ordering::Relaxed), 1);
    }
}
