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

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::event::Receiver;

use super::named::{NamedObject, ObjectEvents};

/// An error related to object registration.
#[derive(Debug)]
pub enum ObjectError {
    /// Another live object already claims the requested name.
    NameConflict {
        /// The contested name.
        name: String,
    },
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::NameConflict { name } => {
                write!(f, "An object named '{name}' is already registered")
            }
        }
    }
}

impl std::error::Error for ObjectError {}

/// Name lookup for [`NamedObject`]s with an explicit lifecycle.
///
/// The registry holds weak references only — it never keeps an object
/// alive. It subscribes to each registered object's events so the map
/// follows renames and drops entries when objects are released. Create one
/// per domain that needs lookup and pass it explicitly; there is no global
/// instance.
pub struct ObjectRegistry {
    objects: Mutex<HashMap<String, Weak<NamedObject>>>,
}

impl ObjectRegistry {
    /// Creates an empty registry, shared-ownership form.
    ///
    /// The registry subscribes itself to registered objects, which requires
    /// shared ownership — hence the `Arc` constructor.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(HashMap::new()),
        })
    }

    /// Adds `object` to the registry under its current name and starts
    /// tracking its lifecycle events.
    ///
    /// Fails with [`ObjectError::NameConflict`] if another live object is
    /// already registered under that name.
    pub fn register(self: &Arc<Self>, object: &Arc<NamedObject>) -> Result<(), ObjectError> {
        let name = object.name();
        {
            let mut objects = self.objects.lock().unwrap();
            if let Some(existing) = objects.get(&name) {
                if existing.strong_count() > 0 {
                    return Err(ObjectError::NameConflict { name });
                }
            }
            objects.insert(name.clone(), Arc::downgrade(object));
        }
        let listener: Arc<dyn ObjectEvents> = self.clone();
        object.events().connect(&listener);
        log::info!("Registered object \"{name}\"");
        Ok(())
    }

    /// Removes `object` from the registry and stops tracking its events.
    ///
    /// A no-op for objects that are not registered here.
    pub fn unregister(self: &Arc<Self>, object: &Arc<NamedObject>) {
        let listener: Arc<dyn ObjectEvents> = self.clone();
        object.events().disconnect(&listener);

        let name = object.name();
        let mut objects = self.objects.lock().unwrap();
        if let Some(entry) = objects.get(&name) {
            if entry.as_ptr() == Arc::as_ptr(object) {
                objects.remove(&name);
                log::debug!("Unregistered object \"{name}\"");
            }
        }
    }

    /// Looks up a live object by name. Dead entries are pruned lazily.
    pub fn get(&self, name: &str) -> Option<Arc<NamedObject>> {
        let mut objects = self.objects.lock().unwrap();
        match objects.get(name) {
            Some(weak) => match weak.upgrade() {
                Some(object) => Some(object),
                None => {
                    objects.remove(name);
                    None
                }
            },
            None => None,
        }
    }

    /// Returns `true` if a live object is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of live registered objects.
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Returns `true` if no live object is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Receiver for ObjectRegistry {}

impl ObjectEvents for ObjectRegistry {
    fn on_object_name_changed(&self, old_name: &str, new_name: &str) {
        let mut objects = self.objects.lock().unwrap();
        if let Some(entry) = objects.remove(old_name) {
            let displaced = objects.insert(new_name.to_owned(), entry);
            if displaced.is_some_and(|previous| previous.strong_count() > 0) {
                // The object is authoritative for its own name; the loser
                // of the collision simply falls out of the lookup.
                log::warn!(
                    "Rename of \"{old_name}\" to \"{new_name}\" displaced another registered object"
                );
            }
        }
    }

    fn on_object_released(&self, name: &str) {
        self.objects.lock().unwrap().remove(name);
        log::debug!("Released object \"{name}\" dropped from registry");
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
