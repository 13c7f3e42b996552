// Copyright 2025 Johann Kempter
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
//
// SPDX-License-Identifier: Apache-2.0

//! Plugin module lifecycle: everything a module registers disappears on
//! unload, and stale handles degrade instead of dangling.

use reflekt::prelude::*;

#[derive(Clone, Debug, PartialEq)]
struct Host {
    value: i32,
}

reflect_type!(Host: eq);

#[derive(Clone, Debug, PartialEq)]
struct PluginType {
    tag: u8,
}

reflect_type!(PluginType: eq);

fn loaded_registry(module: ModuleId) -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register::<Host>("Host").unwrap();
    registry
        .notify_module_loaded(module, |r| {
            r.register::<PluginType>("PluginType")?;
            r.register_method::<PluginType>(MethodDesc::new("tag", |p: &PluginType| {
                i32::from(p.tag)
            }))?;
            r.register_method::<Host>(MethodDesc::new("plugin_extra", |h: &Host| h.value * 2))?;
            r.register_converter(|p: &PluginType| Some(i32::from(p.tag)));
            Ok(())
        })
        .unwrap();
    registry
}

#[test]
fn module_registrations_work_while_loaded() {
    let module = ModuleId::new(1);
    let registry = loaded_registry(module);
    assert!(registry.is_module_loaded(module));

    let ty = registry.get_by_name("PluginType");
    assert!(ty.is_valid());
    assert_eq!(ty.module(), module);

    let plugin = PluginType { tag: 7 };
    let mut inst = Instance::of(&plugin);
    assert_eq!(
        registry.invoke(&mut inst, "tag", &[]).get_value::<i32>(),
        Some(7)
    );

    // The method the plugin attached to a host type resolves too.
    let host = Host { value: 21 };
    let mut inst = Instance::of(&host);
    assert_eq!(
        registry
            .invoke(&mut inst, "plugin_extra", &[])
            .get_value::<i32>(),
        Some(42)
    );

    assert_eq!(
        Variant::new(plugin).convert_value::<i32>(&registry),
        Some(7)
    );
}

#[test]
fn unload_removes_every_registration() {
    let module = ModuleId::new(1);
    let registry = loaded_registry(module);

    let stale = registry.get_by_name("PluginType");
    assert!(stale.is_valid());

    registry.notify_module_unloaded(module).unwrap();
    assert!(!registry.is_module_loaded(module));

    // The old handle flips invalid instead of dangling.
    assert!(!stale.is_valid());
    assert_eq!(stale.name(), "");
    assert!(!registry.get_by_name("PluginType").is_valid());
    assert!(!registry.get::<PluginType>().is_valid());

    // The host type survives, but the plugin's contribution to it is gone.
    let host_ty = registry.get::<Host>();
    assert!(host_ty.is_valid());
    assert!(registry.get_method(&host_ty, "plugin_extra").is_none());

    // Plugin converters are gone too.
    assert_eq!(
        Variant::new(PluginType { tag: 7 }).convert_value::<i32>(&registry),
        None
    );

    // Invoking through a stale value degrades softly.
    let plugin = PluginType { tag: 7 };
    let mut inst = Instance::of(&plugin);
    assert!(!registry.invoke(&mut inst, "tag", &[]).is_valid());
}

#[test]
fn plugin_cannot_capture_host_members_by_reregistering() {
    let module = ModuleId::new(4);
    let registry = TypeRegistry::new();
    registry.register::<Host>("Host").unwrap();
    registry
        .register_method::<Host>(MethodDesc::new("value", |h: &Host| h.value))
        .unwrap();

    // A plugin re-registering an existing host member must not take it over.
    registry
        .notify_module_loaded(module, |r| {
            r.register_method::<Host>(MethodDesc::new("value", |h: &Host| h.value + 1000))
        })
        .unwrap();

    let host = Host { value: 1 };
    let mut inst = Instance::of(&host);
    assert_eq!(
        registry.invoke(&mut inst, "value", &[]).get_value::<i32>(),
        Some(1)
    );

    // Unloading the plugin leaves the host's own member in place.
    registry.notify_module_unloaded(module).unwrap();
    assert_eq!(
        registry.invoke(&mut inst, "value", &[]).get_value::<i32>(),
        Some(1)
    );
}

#[test]
fn reload_assigns_a_fresh_identity() {
    let module = ModuleId::new(1);
    let registry = loaded_registry(module);
    let first_id = registry.get_by_name("PluginType").id();

    registry.notify_module_unloaded(module).unwrap();
    registry
        .notify_module_loaded(module, |r| {
            r.register::<PluginType>("PluginType")?;
            Ok(())
        })
        .unwrap();

    let second_id = registry.get_by_name("PluginType").id();
    assert!(second_id.is_valid());
    assert_ne!(first_id, second_id);
}

#[test]
fn lifecycle_notifications_must_pair_up() {
    let module = ModuleId::new(3);
    let registry = TypeRegistry::new();

    assert!(matches!(
        registry.notify_module_unloaded(module),
        Err(Error::ModuleNotLoaded { .. })
    ));

    registry.notify_module_loaded(module, |_| Ok(())).unwrap();
    assert!(matches!(
        registry.notify_module_loaded(module, |_| Ok(())),
        Err(Error::ModuleAlreadyLoaded { .. })
    ));

    // The main module is always loaded and can never be notified.
    assert!(matches!(
        registry.notify_module_loaded(ModuleId::MAIN, |_| Ok(())),
        Err(Error::ModuleAlreadyLoaded { .. })
    ));

    registry.notify_module_unloaded(module).unwrap();
    assert!(matches!(
        registry.notify_module_unloaded(module),
        Err(Error::ModuleNotLoaded { .. })
    ));
}

#[test]
fn registrations_after_unload_belong_to_main_again() {
    let module = ModuleId::new(2);
    let registry = loaded_registry(module);
    registry.notify_module_unloaded(module).unwrap();

    registry.register::<PluginType>("PluginType").unwrap();
    let ty = registry.get_by_name("PluginType");
    assert_eq!(ty.module(), ModuleId::MAIN);

    // A second unload cannot take the re-registered type with it.
    assert!(registry.notify_module_unloaded(module).is_err());
    assert!(registry.get_by_name("PluginType").is_valid());
}
