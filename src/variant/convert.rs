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

//! Registry-aware conversion of variants.
//!
//! The conversion chain runs these steps in order and stops at the first
//! success; a variant that survives every step unconverted simply fails
//! (no panic, no error value):
//!
//! 1. identity — the value already has the target type
//! 2. built-in rules — the numeric/bool/char/string policies, extended to
//!    registered enumerations (enum ↔ underlying integer, enum ↔ name)
//! 3. user converters — the exact `(source, target)` pair in the
//!    registry's [`crate::convert::ConverterTable`]
//! 4. projection — unwrapping a registered wrapper and upcasting along
//!    registered bases, then cloning the reached subobject as the target
//!    type

use std::cmp::Ordering;

use crate::{
    convert::builtin,
    types::{Type, TypeRegistry},
    value::ReflectValue,
    variant::{
        compare::{cmp_variants, eq_variants},
        Variant,
    },
};

impl Variant {
    /// Apply the builtin rules, seeing through registered enumerations.
    fn builtin_converted(
        &self,
        registry: &TypeRegistry,
        source: &Type,
        target: &Type,
        target_native: std::any::TypeId,
    ) -> Option<Variant> {
        if source.is_enumeration() {
            let desc = registry.enumeration(source)?;
            if target_native == std::any::TypeId::of::<String>() {
                return Some(Variant::new(desc.render(self.as_any()?)?));
            }
            let underlying = desc.underlying_of(self.as_any()?)?;
            return builtin::convert_native(&Variant::new(underlying), target_native);
        }
        if target.is_enumeration() {
            let desc = registry.enumeration(target)?;
            if let Some(name) = self.get_ref::<String>() {
                let found = desc.variant_of(name);
                return found.is_valid().then_some(found);
            }
            let found = desc.from_underlying(builtin::convert_to::<i64>(self)?);
            return found.is_valid().then_some(found);
        }
        builtin::convert_native(self, target_native)
    }

    /// Run the full conversion chain; `None` when no step succeeds.
    fn converted(&self, registry: &TypeRegistry, target: &Type) -> Option<Variant> {
        let target_native = target.native()?;
        let source_native = self.native_id()?;
        if source_native == target_native {
            return Some(self.clone());
        }
        let source = self.get_type(registry);

        if let Some(converted) = self.builtin_converted(registry, &source, target, target_native) {
            return Some(converted);
        }
        if let Some(converted) = registry.converter_table().convert(self, target_native) {
            return Some(converted);
        }
        // Wrapper unwrapping and base upcasts, then clone the subobject.
        let projected = registry.project_shared(self.as_any()?, target.id())?;
        let descriptor = target.descriptor()?;
        (descriptor.clone_value)(projected)
    }

    /// `true` when [`Variant::convert`] to `target` would succeed.
    #[must_use]
    pub fn can_convert(&self, registry: &TypeRegistry, target: &Type) -> bool {
        self.converted(registry, target).is_some()
    }

    /// Convert the held value to `target` in place.
    ///
    /// On failure the variant is left untouched and `false` is returned.
    pub fn convert(&mut self, registry: &TypeRegistry, target: &Type) -> bool {
        match self.converted(registry, target) {
            Some(converted) => {
                *self = converted;
                true
            }
            None => false,
        }
    }

    /// Convert the held value to `T`, consulting the full chain.
    ///
    /// Unlike [`Variant::get_value`] this converts rather than merely
    /// extracts: `Variant::new(23i32).convert_value::<String>(&r)` yields
    /// `"23"`.
    #[must_use]
    pub fn convert_value<T: ReflectValue + Clone>(&self, registry: &TypeRegistry) -> Option<T> {
        if self.is_type::<T>() {
            return self.get_value::<T>();
        }
        let target = registry.get_by_native(std::any::TypeId::of::<T>());
        self.converted(registry, &target)?.get_value::<T>()
    }

    /// Registry-aware equality: the weak-total `==` chain first, then a
    /// conversion of either side to the other's exact type.
    #[must_use]
    pub fn equals_with(&self, registry: &TypeRegistry, other: &Variant) -> bool {
        if eq_variants(self, other) {
            return true;
        }
        if self.native_id() == other.native_id() {
            return false;
        }
        let other_ty = other.get_type(registry);
        if let Some(converted) = self.converted(registry, &other_ty) {
            if eq_variants(&converted, other) {
                return true;
            }
        }
        let self_ty = self.get_type(registry);
        match other.converted(registry, &self_ty) {
            Some(converted) => eq_variants(self, &converted),
            None => false,
        }
    }

    /// Registry-aware ordering, with the same conversion fallback as
    /// [`Variant::equals_with`].
    #[must_use]
    pub fn compare_with(&self, registry: &TypeRegistry, other: &Variant) -> Option<Ordering> {
        if let Some(ordering) = cmp_variants(self, other) {
            return Some(ordering);
        }
        if self.native_id() == other.native_id() {
            return None;
        }
        let other_ty = other.get_type(registry);
        if let Some(converted) = self.converted(registry, &other_ty) {
            if let Some(ordering) = cmp_variants(&converted, other) {
                return Some(ordering);
            }
        }
        let self_ty = self.get_type(registry);
        cmp_variants(self, &other.converted(registry, &self_ty)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect_type;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Color {
        Red = 1,
        Green = 2,
    }

    reflect_type!(Color: eq);

    fn registry_with_color() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .register_enumeration(
                "Color",
                vec![("Red", Color::Red), ("Green", Color::Green)],
                |c| *c as i64,
            )
            .unwrap();
        registry
    }

    #[test]
    fn builtin_chain_through_registry() {
        let registry = TypeRegistry::new();
        let mut v = Variant::new(23i32);
        assert!(v.can_convert(&registry, &registry.get::<String>()));
        assert!(v.convert(&registry, &registry.get::<String>()));
        assert_eq!(v.get_value::<String>(), Some("23".to_string()));

        assert_eq!(
            Variant::from("23").convert_value::<i32>(&registry),
            Some(23)
        );
        assert_eq!(Variant::from("23abc").convert_value::<i32>(&registry), None);
    }

    #[test]
    fn failed_convert_leaves_variant_untouched() {
        let registry = TypeRegistry::new();
        let mut v = Variant::from("not a number");
        assert!(!v.convert(&registry, &registry.get::<i32>()));
        assert_eq!(v.get_value::<String>(), Some("not a number".to_string()));
    }

    #[test]
    fn enum_to_string_and_back() {
        let registry = registry_with_color();
        let color_ty = registry.get::<Color>();

        let red = Variant::new(Color::Red);
        assert_eq!(
            red.convert_value::<String>(&registry),
            Some("Red".to_string())
        );
        assert_eq!(
            Variant::from("Green").convert_value::<Color>(&registry),
            Some(Color::Green)
        );
        assert!(!Variant::from("Blue").can_convert(&registry, &color_ty));
    }

    #[test]
    fn enum_to_number_and_back() {
        let registry = registry_with_color();
        assert_eq!(
            Variant::new(Color::Green).convert_value::<i32>(&registry),
            Some(2)
        );
        assert_eq!(
            Variant::new(2i32).convert_value::<Color>(&registry),
            Some(Color::Green)
        );
        assert_eq!(Variant::new(9i32).convert_value::<Color>(&registry), None);
    }

    #[test]
    fn user_converter_runs_after_builtins() {
        #[derive(Clone, Debug, PartialEq)]
        struct Meters(f64);
        reflect_type!(Meters: eq);

        let registry = TypeRegistry::new();
        registry.register::<Meters>("Meters").unwrap();
        registry.register_converter(|m: &Meters| Some(m.0 * 100.0));

        let v = Variant::new(Meters(1.5));
        assert_eq!(v.convert_value::<f64>(&registry), Some(150.0));
        // No converter for the reverse direction was registered.
        assert_eq!(Variant::new(150.0f64).convert_value::<Meters>(&registry), None);
    }

    #[test]
    fn wrapper_converts_to_pointee_copy() {
        use std::sync::Arc;

        #[derive(Clone, Debug, PartialEq)]
        struct Payload(i32);
        reflect_type!(Payload: eq);

        let registry = TypeRegistry::new();
        registry.register::<Payload>("Payload").unwrap();
        registry.register_shared::<Payload>("Arc<Payload>").unwrap();

        let v = Variant::new(Arc::new(Payload(7)));
        assert_eq!(v.convert_value::<Payload>(&registry), Some(Payload(7)));
    }

    #[test]
    fn derived_converts_to_base_copy() {
        #[derive(Clone, Debug, PartialEq)]
        struct Base(i32);
        reflect_type!(Base: eq);

        #[derive(Clone, Debug, PartialEq)]
        struct Derived {
            base: Base,
            extra: u8,
        }
        reflect_type!(Derived: eq);

        let registry = TypeRegistry::new();
        registry.register::<Base>("Base").unwrap();
        registry.register::<Derived>("Derived").unwrap();
        registry
            .register_base::<Derived, Base>(|d| &d.base, |d| &mut d.base)
            .unwrap();

        let v = Variant::new(Derived {
            base: Base(3),
            extra: 0,
        });
        assert_eq!(v.convert_value::<Base>(&registry), Some(Base(3)));
        // Downcasting is not a conversion.
        assert_eq!(
            Variant::new(Base(3)).convert_value::<Derived>(&registry),
            None
        );
    }

    #[test]
    fn registry_equality_consults_converters() {
        let registry = registry_with_color();
        let red = Variant::new(Color::Red);
        assert!(red.equals_with(&registry, &Variant::from("Red")));
        assert!(!red.equals_with(&registry, &Variant::from("Green")));
        assert!(red.equals_with(&registry, &Variant::new(1i64)));

        assert_eq!(
            Variant::new(Color::Red).compare_with(&registry, &Variant::new(2i32)),
            Some(Ordering::Less)
        );
    }
}
