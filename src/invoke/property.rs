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

//! Property descriptors.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    invoke::{parameter::AccessLevel, Argument, Instance},
    types::{TypeId, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

type Getter = Arc<dyn Fn(&TypeRegistry, &Instance<'_>) -> Variant + Send + Sync>;
type Setter = Arc<dyn Fn(&TypeRegistry, &mut Instance<'_>, &Variant) -> bool + Send + Sync>;

fn resolve_shared<'r, C: 'static>(
    registry: &TypeRegistry,
    instance: &'r Instance<'_>,
) -> Option<&'r C> {
    let any = instance.shared_any()?;
    if let Some(receiver) = any.downcast_ref::<C>() {
        return Some(receiver);
    }
    registry.upcast_to::<C>(any)
}

fn resolve_exclusive<'r, C: 'static>(
    registry: &TypeRegistry,
    instance: &'r mut Instance<'_>,
) -> Option<&'r mut C> {
    let any = instance.exclusive_any()?;
    if any.downcast_ref::<C>().is_some() {
        return any.downcast_mut::<C>();
    }
    registry.upcast_mut_to::<C>(any)
}

/// A registered property: a named, typed value slot on a type (or a global
/// one).
///
/// Four backing shapes exist — a field projection pair, a getter/setter
/// closure pair, a getter only, and global closures — and dispatch is
/// uniform across them. Reads yield a copy of the value; a read-only
/// property fails [`PropertyDesc::set_value`] with no side effect.
///
/// # Examples
///
/// ```rust
/// use reflekt::{reflect_type, Argument, Instance, PropertyDesc, TypeRegistry, Variant};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// reflect_type!(Point: eq);
///
/// let registry = TypeRegistry::new();
/// let prop = PropertyDesc::from_field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x);
///
/// let mut point = Point { x: 1, y: 2 };
/// let mut inst = Instance::of_mut(&mut point);
/// let value = Variant::new(5i32);
/// assert!(prop.set_value(&registry, &mut inst, &Argument::new(&value)));
/// assert_eq!(prop.get_value(&registry, &inst).get_value::<i32>(), Some(5));
/// ```
pub struct PropertyDesc {
    pub(crate) name: String,
    pub(crate) declaring: TypeId,
    pub(crate) value_native: std::any::TypeId,
    pub(crate) value_type_name: &'static str,
    pub(crate) access: AccessLevel,
    pub(crate) is_static: bool,
    pub(crate) metadata: DashMap<String, Variant>,
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertyDesc {
    fn with_parts(
        name: impl Into<String>,
        value_native: std::any::TypeId,
        value_type_name: &'static str,
        is_static: bool,
        getter: Getter,
        setter: Option<Setter>,
    ) -> Self {
        PropertyDesc {
            name: name.into(),
            declaring: TypeId::INVALID,
            value_native,
            value_type_name,
            access: AccessLevel::default(),
            is_static,
            metadata: DashMap::new(),
            getter,
            setter,
        }
    }

    /// Back the property by a pair of field projections.
    pub fn from_field<C, T>(
        name: impl Into<String>,
        shared: fn(&C) -> &T,
        exclusive: fn(&mut C) -> &mut T,
    ) -> Self
    where
        C: ReflectValue,
        T: ReflectValue + Clone,
    {
        let getter: Getter = Arc::new(move |registry, instance| {
            match resolve_shared::<C>(registry, instance) {
                Some(receiver) => Variant::new(shared(receiver).clone()),
                None => Variant::empty(),
            }
        });
        let setter: Setter = Arc::new(move |registry, instance, value| {
            let Some(value) = value.get_ref::<T>() else {
                return false;
            };
            match resolve_exclusive::<C>(registry, instance) {
                Some(receiver) => {
                    *exclusive(receiver) = value.clone();
                    true
                }
                None => false,
            }
        });
        Self::with_parts(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            false,
            getter,
            Some(setter),
        )
    }

    /// Back the property by a getter/setter closure pair.
    pub fn from_accessors<C, T, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        C: ReflectValue,
        T: ReflectValue + Clone,
        G: Fn(&C) -> T + Send + Sync + 'static,
        S: Fn(&mut C, T) + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |registry, instance| {
            match resolve_shared::<C>(registry, instance) {
                Some(receiver) => Variant::new(get(receiver)),
                None => Variant::empty(),
            }
        });
        let setter: Setter = Arc::new(move |registry, instance, value| {
            let Some(value) = value.get_value::<T>() else {
                return false;
            };
            match resolve_exclusive::<C>(registry, instance) {
                Some(receiver) => {
                    set(receiver, value);
                    true
                }
                None => false,
            }
        });
        Self::with_parts(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            false,
            getter,
            Some(setter),
        )
    }

    /// Back the property by a getter only; the property is read-only.
    pub fn getter_only<C, T, G>(name: impl Into<String>, get: G) -> Self
    where
        C: ReflectValue,
        T: ReflectValue + Clone,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |registry, instance| {
            match resolve_shared::<C>(registry, instance) {
                Some(receiver) => Variant::new(get(receiver)),
                None => Variant::empty(),
            }
        });
        Self::with_parts(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            false,
            getter,
            None,
        )
    }

    /// Back the property by receiver-less closures (global state).
    ///
    /// Dispatches with any instance, including the unit instance.
    pub fn global<T, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        T: ReflectValue + Clone,
        G: Fn() -> T + Send + Sync + 'static,
        S: Fn(T) + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |_registry, _instance| Variant::new(get()));
        let setter: Setter = Arc::new(move |_registry, _instance, value| {
            match value.get_value::<T>() {
                Some(value) => {
                    set(value);
                    true
                }
                None => false,
            }
        });
        Self::with_parts(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            true,
            getter,
            Some(setter),
        )
    }

    /// Back the property by a receiver-less getter only.
    pub fn global_readonly<T, G>(name: impl Into<String>, get: G) -> Self
    where
        T: ReflectValue + Clone,
        G: Fn() -> T + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |_registry, _instance| Variant::new(get()));
        Self::with_parts(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            true,
            getter,
            None,
        )
    }

    /// Set the declared access level.
    #[must_use]
    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    /// Attach a metadata value under `key`.
    #[must_use]
    pub fn with_metadata(self, key: &str, value: Variant) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// The registered property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric id of the declaring type; invalid for global properties.
    #[must_use]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring
    }

    /// The [`std::any::TypeId`] of the property value type.
    #[must_use]
    pub fn value_native(&self) -> std::any::TypeId {
        self.value_native
    }

    /// Compile-time name of the property value type.
    #[must_use]
    pub fn value_type_name(&self) -> &str {
        self.value_type_name
    }

    /// The declared access level.
    #[must_use]
    pub fn access(&self) -> AccessLevel {
        self.access
    }

    /// `true` when no setter is registered.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// `true` when the property dispatches without a receiver.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Look up a metadata value by key.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Variant> {
        self.metadata.get(key).map(|v| v.clone())
    }

    /// Read the property value; empty variant when the receiver does not
    /// match.
    pub fn get_value(&self, registry: &TypeRegistry, instance: &Instance<'_>) -> Variant {
        (self.getter)(registry, instance)
    }

    /// Write the property value.
    ///
    /// Fails with no side effect when the property is read-only, the value
    /// is not exactly the property type, or the instance is not a mutable
    /// receiver of the declaring type.
    pub fn set_value(
        &self,
        registry: &TypeRegistry,
        instance: &mut Instance<'_>,
        value: &Argument<'_>,
    ) -> bool {
        match &self.setter {
            Some(setter) => setter(registry, instance, value.variant()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Circle {
        radius: f64,
    }

    crate::reflect_type!(Circle: eq);

    #[test]
    fn field_backed_round_trip() {
        let registry = TypeRegistry::new();
        let prop = PropertyDesc::from_field(
            "radius",
            |c: &Circle| &c.radius,
            |c: &mut Circle| &mut c.radius,
        );

        let mut circle = Circle { radius: 1.0 };
        let mut inst = Instance::of_mut(&mut circle);
        let value = Variant::new(2.5f64);
        assert!(prop.set_value(&registry, &mut inst, &Argument::new(&value)));
        assert_eq!(
            prop.get_value(&registry, &inst).get_value::<f64>(),
            Some(2.5)
        );
    }

    #[test]
    fn read_only_set_fails_without_side_effect() {
        let registry = TypeRegistry::new();
        let prop = PropertyDesc::getter_only("area", |c: &Circle| {
            c.radius * c.radius * std::f64::consts::PI
        });
        assert!(prop.is_read_only());

        let mut circle = Circle { radius: 2.0 };
        let mut inst = Instance::of_mut(&mut circle);
        let value = Variant::new(100.0f64);
        assert!(!prop.set_value(&registry, &mut inst, &Argument::new(&value)));
        drop(inst);
        assert_eq!(circle.radius, 2.0);
    }

    #[test]
    fn wrong_value_type_fails() {
        let registry = TypeRegistry::new();
        let prop = PropertyDesc::from_field(
            "radius",
            |c: &Circle| &c.radius,
            |c: &mut Circle| &mut c.radius,
        );

        let mut circle = Circle { radius: 1.0 };
        let mut inst = Instance::of_mut(&mut circle);
        let value = Variant::new(2.5f32);
        assert!(!prop.set_value(&registry, &mut inst, &Argument::new(&value)));
    }

    #[test]
    fn shared_instance_cannot_set() {
        let registry = TypeRegistry::new();
        let prop = PropertyDesc::from_field(
            "radius",
            |c: &Circle| &c.radius,
            |c: &mut Circle| &mut c.radius,
        );

        let circle = Circle { radius: 1.0 };
        let mut inst = Instance::of(&circle);
        let value = Variant::new(2.5f64);
        assert!(!prop.set_value(&registry, &mut inst, &Argument::new(&value)));
        assert_eq!(
            prop.get_value(&registry, &inst).get_value::<f64>(),
            Some(1.0)
        );
    }

    #[test]
    fn global_property() {
        static STATE: AtomicI64 = AtomicI64::new(10);

        let registry = TypeRegistry::new();
        let prop = PropertyDesc::global(
            "state",
            || STATE.load(Ordering::SeqCst),
            |v: i64| STATE.store(v, Ordering::SeqCst),
        );
        assert!(prop.is_static());

        let mut unit = Instance::Unit;
        assert_eq!(
            prop.get_value(&registry, &unit).get_value::<i64>(),
            Some(10)
        );
        let value = Variant::new(11i64);
        assert!(prop.set_value(&registry, &mut unit, &Argument::new(&value)));
        assert_eq!(STATE.load(Ordering::SeqCst), 11);
    }
}
