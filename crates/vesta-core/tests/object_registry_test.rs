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

use std::sync::Arc;

use vesta_core::object::{NamedObject, ObjectRegistry};

#[test]
fn rename_rekeys_the_registry() {
    let registry = ObjectRegistry::new();
    let window = Arc::new(NamedObject::new("Main Window"));
    registry.register(&window).expect("registration should succeed");

    let renamed = window.set_name("Primary Window");

    assert!(renamed);
    assert!(
        registry.get("Main Window").is_none(),
        "the old name must no longer resolve"
    );
    let found = registry
        .get("Primary Window")
        .expect("the new name must resolve");
    assert!(Arc::ptr_eq(&found, &window));
}

#[test]
fn releasing_an_object_prunes_its_entry() {
    let registry = ObjectRegistry::new();
    {
        let target = Arc::new(NamedObject::new("Offscreen Target"));
        registry.register(&target).expect("registration should succeed");
        assert!(registry.contains("Offscreen Target"));
    }
    assert!(
        !registry.contains("Offscreen Target"),
        "the release notification must drop the entry"
    );
    assert!(registry.is_empty());
}

#[test]
fn rename_collision_lets_the_renamed_object_win() {
    let registry = ObjectRegistry::new();
    let first = Arc::new(NamedObject::new("Color Target"));
    let second = Arc::new(NamedObject::new("Depth Target"));
    registry.register(&first).expect("first registration should succeed");
    registry.register(&second).expect("second registration should succeed");

    second.set_name("Color Target");

    let found = registry
        .get("Color Target")
        .expect("the contested name must still resolve");
    assert!(
        Arc::ptr_eq(&found, &second),
        "the most recently renamed object owns the name"
    );
    assert!(registry.get("Depth Target").is_none());
}

#[test]
fn unregistered_object_keeps_its_own_events_working() {
    let registry = ObjectRegistry::new();
    let mesh = Arc::new(NamedObject::new("Quad Mesh"));
    registry.register(&mesh).expect("registration should succeed");

    registry.unregister(&mesh);
    mesh.set_name("Triangle Mesh");

    assert!(
        registry.get("Quad Mesh").is_none() && registry.get("Triangle Mesh").is_none(),
        "the registry must not follow renames of unregistered objects"
    );
    assert_eq!(mesh.name(), "Triangle Mesh");
}
