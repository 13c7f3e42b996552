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

//! Conversion between registered types.
//!
//! Two layers cooperate when a [`crate::Variant`] is converted:
//!
//! 1. **Built-in rules** ([`builtin`], crate-internal) — the fixed
//!    numeric/bool/char/string policies that are always consulted first.
//! 2. **The converter table** ([`ConverterTable`]) — user-registered
//!    `(source type → target type)` functions, keyed by the exact pair of
//!    types. Registering `A → B` never implies `B → A`, and a later
//!    registration for the same pair overwrites the earlier one.
//!
//! The table is owned by [`crate::TypeRegistry`]; converters registered
//! while a plugin module is active are removed again when that module
//! unloads.

pub(crate) mod builtin;

use std::{any::TypeId, sync::Arc};

use dashmap::DashMap;

use crate::{types::ModuleId, value::ReflectValue, variant::Variant};

/// Erased converter function: reads the source value, produces a variant of
/// the target type, or fails.
type ConverterFn = Arc<dyn Fn(&dyn std::any::Any) -> Option<Variant> + Send + Sync>;

/// Table of user-registered conversion functions.
///
/// Thread-safe for concurrent lookups; registration follows the crate-wide
/// rule that mutation must be serialized by the embedder.
#[derive(Default)]
pub struct ConverterTable {
    converters: DashMap<(TypeId, TypeId), (ModuleId, ConverterFn)>,
}

impl ConverterTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        ConverterTable {
            converters: DashMap::new(),
        }
    }

    /// Register a conversion function from `S` to `T`.
    ///
    /// The function returns `None` to signal a failed conversion (e.g. an
    /// out-of-range or unparsable source value). Any previous converter for
    /// the same `(S, T)` pair is overwritten.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reflekt::convert::ConverterTable;
    ///
    /// let table = ConverterTable::new();
    /// table.register(|s: &String| s.parse::<u128>().ok().map(|v| v.to_string()));
    /// ```
    pub fn register<S, T, F>(&self, converter: F)
    where
        S: ReflectValue,
        T: ReflectValue,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        self.register_for_module(ModuleId::MAIN, converter);
    }

    /// Register a conversion function attributed to a plugin module.
    pub(crate) fn register_for_module<S, T, F>(&self, module: ModuleId, converter: F)
    where
        S: ReflectValue,
        T: ReflectValue,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        let erased: ConverterFn = Arc::new(move |source| {
            source
                .downcast_ref::<S>()
                .and_then(&converter)
                .map(Variant::new)
        });
        self.converters
            .insert((TypeId::of::<S>(), TypeId::of::<T>()), (module, erased));
    }

    /// Look up and apply the converter for the held value and target type.
    pub(crate) fn convert(&self, source: &Variant, target: TypeId) -> Option<Variant> {
        let native = source.native_id()?;
        let entry = self.converters.get(&(native, target))?;
        let converted = (entry.value().1)(source.as_any()?);
        debug_assert!(
            converted
                .as_ref()
                .map_or(true, |v| v.native_id() == Some(target)),
            "converter produced a value of the wrong type"
        );
        converted
    }

    /// `true` when a converter for the exact pair is registered.
    #[must_use]
    pub fn has_converter(&self, source: TypeId, target: TypeId) -> bool {
        self.converters.contains_key(&(source, target))
    }

    /// Drop every converter registered by `module`.
    pub(crate) fn remove_module(&self, module: ModuleId) {
        self.converters.retain(|_, entry| entry.0 != module);
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// `true` when no converter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_convert() {
        let table = ConverterTable::new();
        table.register(|s: &i32| Some(format!("#{s}")));

        let source = Variant::new(5i32);
        let result = table.convert(&source, TypeId::of::<String>()).unwrap();
        assert_eq!(result.get_value::<String>(), Some("#5".to_string()));
    }

    #[test]
    fn conversion_is_directional() {
        let table = ConverterTable::new();
        table.register(|s: &i32| Some(s.to_string()));

        assert!(table.has_converter(TypeId::of::<i32>(), TypeId::of::<String>()));
        assert!(!table.has_converter(TypeId::of::<String>(), TypeId::of::<i32>()));
        assert!(table
            .convert(&Variant::from("5"), TypeId::of::<i32>())
            .is_none());
    }

    #[test]
    fn converter_may_fail() {
        let table = ConverterTable::new();
        table.register(|s: &String| s.trim().parse::<i32>().ok());

        assert!(table
            .convert(&Variant::from("abc"), TypeId::of::<i32>())
            .is_none());
        let ok = table
            .convert(&Variant::from("42"), TypeId::of::<i32>())
            .unwrap();
        assert_eq!(ok.get_value::<i32>(), Some(42));
    }

    #[test]
    fn reregistration_overwrites() {
        let table = ConverterTable::new();
        table.register(|_: &i32| Some("old".to_string()));
        table.register(|_: &i32| Some("new".to_string()));

        let result = table
            .convert(&Variant::new(1i32), TypeId::of::<String>())
            .unwrap();
        assert_eq!(result.get_value::<String>(), Some("new".to_string()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn module_removal_is_scoped() {
        let table = ConverterTable::new();
        table.register(|s: &i32| Some(s.to_string()));
        table.register_for_module(ModuleId::new(7), |s: &u32| Some(s.to_string()));

        table.remove_module(ModuleId::new(7));
        assert!(table.has_converter(TypeId::of::<i32>(), TypeId::of::<String>()));
        assert!(!table.has_converter(TypeId::of::<u32>(), TypeId::of::<String>()));
    }
}
