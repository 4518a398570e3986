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

// Vesta Sandbox
// Simulates the engine's primary notification flow: a render device being
// removed while contexts holding its resources listen for the removal.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use vesta_core::event::{Emitter, EmitterHandle, Receiver};
use vesta_core::object::{NamedObject, ObjectRegistry};

/// Device lifecycle event category.
trait DeviceEvents: Receiver {
    /// The device is about to be removed; listeners should release
    /// device-owned resources now.
    fn on_removal_requested(&self, _adapter_name: &str) {}

    /// The device is gone.
    fn on_removed(&self, _adapter_name: &str) {}
}

/// A GPU device stand-in: a named object plus a device event channel.
struct RenderDevice {
    object: Arc<NamedObject>,
    events: Emitter<dyn DeviceEvents>,
}

impl RenderDevice {
    fn new(adapter_name: &str) -> Arc<Self> {
        Arc::new(Self {
            object: Arc::new(NamedObject::new(adapter_name)),
            events: Emitter::new(),
        })
    }

    fn request_removal(&self) {
        let name = self.object.name();
        log::warn!("Device \"{name}\" removal requested");
        self.events
            .emit(|receiver| receiver.on_removal_requested(&name));
    }

    fn remove(&self) {
        let name = self.object.name();
        log::warn!("Device \"{name}\" removed");
        self.events.emit(|receiver| receiver.on_removed(&name));
    }
}

/// Listener standing in for a frame context holding device resources.
struct FrameContext {
    label: &'static str,
    held_buffers: Mutex<Vec<String>>,
}

impl FrameContext {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            held_buffers: Mutex::new(vec![
                "uniform-ring".to_owned(),
                "staging".to_owned(),
                "depth".to_owned(),
            ]),
        })
    }
}

impl Receiver for FrameContext {
    fn on_connected(&self, emitter: &dyn EmitterHandle) {
        log::info!(
            "Context \"{}\" now listening to emitter {}",
            self.label,
            emitter.emitter_id()
        );
    }

    fn on_disconnected(&self, emitter: &dyn EmitterHandle) {
        log::info!(
            "Context \"{}\" detached from emitter {}",
            self.label,
            emitter.emitter_id()
        );
    }
}

impl DeviceEvents for FrameContext {
    fn on_removal_requested(&self, adapter_name: &str) {
        let released = self.held_buffers.lock().unwrap().drain(..).count();
        log::info!(
            "Context \"{}\" released {released} buffer(s) ahead of \"{adapter_name}\" removal",
            self.label
        );
    }

    fn on_removed(&self, adapter_name: &str) {
        log::info!(
            "Context \"{}\" observed \"{adapter_name}\" removal",
            self.label
        );
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let registry = ObjectRegistry::new();
    let device = RenderDevice::new("GPU-0 (discrete)");
    registry.register(&device.object)?;

    let main_context = FrameContext::new("main");
    let offscreen_context = FrameContext::new("offscreen");
    device
        .events
        .connect(&(Arc::clone(&main_context) as Arc<dyn DeviceEvents>));
    device
        .events
        .connect(&(Arc::clone(&offscreen_context) as Arc<dyn DeviceEvents>));

    log::info!(
        "Device \"{}\" has {} listener(s)",
        device.object.name(),
        device.events.receiver_count()
    );

    // A driver update renames the adapter; the registry follows.
    device.object.set_name("GPU-0 (discrete, driver 551.23)");
    log::info!(
        "Registry resolves renamed device: {}",
        registry.contains(&device.object.name())
    );

    device.request_removal();
    device.remove();

    device
        .events
        .disconnect(&(Arc::clone(&offscreen_context) as Arc<dyn DeviceEvents>));
    drop(device);

    log::info!("Sandbox finished");
    Ok(())
}
