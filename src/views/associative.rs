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

//! Associative container views.

use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::Hash,
    sync::Arc,
};

use crate::{
    types::{Type, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

/// Operations a concrete associative container exposes to the erased view
/// machinery.
///
/// Implemented for `HashMap`, `BTreeMap`, `HashSet` and `BTreeSet`. Set-like
/// containers mark themselves [`AssociativeBacking::KEY_ONLY`] and use the
/// key type as their value type; key-only insertion fails on maps and
/// pair insertion fails on sets.
pub trait AssociativeBacking: ReflectValue {
    /// Key type of the container.
    type Key: ReflectValue + Clone;
    /// Mapped value type; for set-like containers this is the key type.
    type Value: ReflectValue + Clone;

    /// `true` for set-like containers storing keys without mapped values.
    const KEY_ONLY: bool;

    /// Current entry count.
    fn assoc_len(&self) -> usize;
    /// `true` when `key` is present.
    fn assoc_contains(&self, key: &Self::Key) -> bool;
    /// Copy out the value stored under `key` (the key itself for sets).
    fn assoc_find(&self, key: &Self::Key) -> Option<Self::Value>;
    /// Insert a bare key; fails unless [`AssociativeBacking::KEY_ONLY`].
    fn assoc_insert_key(&mut self, key: Self::Key) -> bool;
    /// Insert a key/value pair; fails for key-only containers. Maps
    /// overwrite an existing entry.
    fn assoc_insert(&mut self, key: Self::Key, value: Self::Value) -> bool;
    /// Remove the entry under `key`, returning the number removed (0 or 1).
    fn assoc_erase(&mut self, key: &Self::Key) -> usize;
    /// Remove all entries.
    fn assoc_clear(&mut self);
    /// Copy out all entries; for sets the value mirrors the key.
    fn assoc_entries(&self) -> Vec<(Self::Key, Self::Value)>;
}

impl<K, V> AssociativeBacking for HashMap<K, V>
where
    K: ReflectValue + Clone + Eq + Hash,
    V: ReflectValue + Clone + PartialEq,
{
    type Key = K;
    type Value = V;
    const KEY_ONLY: bool = false;

    fn assoc_len(&self) -> usize {
        self.len()
    }
    fn assoc_contains(&self, key: &K) -> bool {
        self.contains_key(key)
    }
    fn assoc_find(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }
    fn assoc_insert_key(&mut self, _key: K) -> bool {
        false
    }
    fn assoc_insert(&mut self, key: K, value: V) -> bool {
        self.insert(key, value);
        true
    }
    fn assoc_erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }
    fn assoc_clear(&mut self) {
        self.clear();
    }
    fn assoc_entries(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V> AssociativeBacking for BTreeMap<K, V>
where
    K: ReflectValue + Clone + Ord,
    V: ReflectValue + Clone + PartialEq,
{
    type Key = K;
    type Value = V;
    const KEY_ONLY: bool = false;

    fn assoc_len(&self) -> usize {
        self.len()
    }
    fn assoc_contains(&self, key: &K) -> bool {
        self.contains_key(key)
    }
    fn assoc_find(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }
    fn assoc_insert_key(&mut self, _key: K) -> bool {
        false
    }
    fn assoc_insert(&mut self, key: K, value: V) -> bool {
        self.insert(key, value);
        true
    }
    fn assoc_erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }
    fn assoc_clear(&mut self) {
        self.clear();
    }
    fn assoc_entries(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K> AssociativeBacking for HashSet<K>
where
    K: ReflectValue + Clone + Eq + Hash,
{
    type Key = K;
    type Value = K;
    const KEY_ONLY: bool = true;

    fn assoc_len(&self) -> usize {
        self.len()
    }
    fn assoc_contains(&self, key: &K) -> bool {
        self.contains(key)
    }
    fn assoc_find(&self, key: &K) -> Option<K> {
        self.get(key).cloned()
    }
    fn assoc_insert_key(&mut self, key: K) -> bool {
        self.insert(key)
    }
    fn assoc_insert(&mut self, _key: K, _value: K) -> bool {
        false
    }
    fn assoc_erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key))
    }
    fn assoc_clear(&mut self) {
        self.clear();
    }
    fn assoc_entries(&self) -> Vec<(K, K)> {
        self.iter().map(|k| (k.clone(), k.clone())).collect()
    }
}

impl<K> AssociativeBacking for BTreeSet<K>
where
    K: ReflectValue + Clone + Ord,
{
    type Key = K;
    type Value = K;
    const KEY_ONLY: bool = true;

    fn assoc_len(&self) -> usize {
        self.len()
    }
    fn assoc_contains(&self, key: &K) -> bool {
        self.contains(key)
    }
    fn assoc_find(&self, key: &K) -> Option<K> {
        self.get(key).cloned()
    }
    fn assoc_insert_key(&mut self, key: K) -> bool {
        self.insert(key)
    }
    fn assoc_insert(&mut self, _key: K, _value: K) -> bool {
        false
    }
    fn assoc_erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key))
    }
    fn assoc_clear(&mut self) {
        self.clear();
    }
    fn assoc_entries(&self) -> Vec<(K, K)> {
        self.iter().map(|k| (k.clone(), k.clone())).collect()
    }
}

/// Erased operation table for one concrete associative container type.
pub(crate) struct AssociativeAdapter {
    pub(crate) key_only: bool,
    pub(crate) key_native: std::any::TypeId,
    pub(crate) value_native: std::any::TypeId,
    len: fn(&dyn Any) -> Option<usize>,
    contains: fn(&dyn Any, &Variant) -> bool,
    find: fn(&dyn Any, &Variant) -> Variant,
    insert_key: fn(&mut dyn Any, &Variant) -> bool,
    insert_pair: fn(&mut dyn Any, &Variant, &Variant) -> bool,
    erase: fn(&mut dyn Any, &Variant) -> usize,
    clear: fn(&mut dyn Any) -> bool,
    entries: fn(&dyn Any) -> Vec<(Variant, Variant)>,
}

fn len_erased<C: AssociativeBacking>(any: &dyn Any) -> Option<usize> {
    any.downcast_ref::<C>().map(C::assoc_len)
}

fn contains_erased<C: AssociativeBacking>(any: &dyn Any, key: &Variant) -> bool {
    match (any.downcast_ref::<C>(), key.get_ref::<C::Key>()) {
        (Some(c), Some(key)) => c.assoc_contains(key),
        _ => false,
    }
}

fn find_erased<C: AssociativeBacking>(any: &dyn Any, key: &Variant) -> Variant {
    match (any.downcast_ref::<C>(), key.get_ref::<C::Key>()) {
        (Some(c), Some(key)) => c.assoc_find(key).map_or_else(Variant::empty, Variant::new),
        _ => Variant::empty(),
    }
}

fn insert_key_erased<C: AssociativeBacking>(any: &mut dyn Any, key: &Variant) -> bool {
    let Some(key) = key.get_ref::<C::Key>() else {
        return false;
    };
    let key = key.clone();
    any.downcast_mut::<C>()
        .is_some_and(|c| c.assoc_insert_key(key))
}

fn insert_pair_erased<C: AssociativeBacking>(
    any: &mut dyn Any,
    key: &Variant,
    value: &Variant,
) -> bool {
    let (Some(key), Some(value)) = (key.get_ref::<C::Key>(), value.get_ref::<C::Value>()) else {
        return false;
    };
    let (key, value) = (key.clone(), value.clone());
    any.downcast_mut::<C>()
        .is_some_and(|c| c.assoc_insert(key, value))
}

fn erase_erased<C: AssociativeBacking>(any: &mut dyn Any, key: &Variant) -> usize {
    match (any.downcast_mut::<C>(), key.get_ref::<C::Key>()) {
        (Some(c), Some(key)) => c.assoc_erase(key),
        _ => 0,
    }
}

fn clear_erased<C: AssociativeBacking>(any: &mut dyn Any) -> bool {
    match any.downcast_mut::<C>() {
        Some(c) => {
            c.assoc_clear();
            true
        }
        None => false,
    }
}

fn entries_erased<C: AssociativeBacking>(any: &dyn Any) -> Vec<(Variant, Variant)> {
    match any.downcast_ref::<C>() {
        Some(c) => c
            .assoc_entries()
            .into_iter()
            .map(|(k, v)| (Variant::new(k), Variant::new(v)))
            .collect(),
        None => Vec::new(),
    }
}

impl AssociativeAdapter {
    pub(crate) fn of<C: AssociativeBacking>() -> Self {
        AssociativeAdapter {
            key_only: C::KEY_ONLY,
            key_native: std::any::TypeId::of::<C::Key>(),
            value_native: std::any::TypeId::of::<C::Value>(),
            len: len_erased::<C>,
            contains: contains_erased::<C>,
            find: find_erased::<C>,
            insert_key: insert_key_erased::<C>,
            insert_pair: insert_pair_erased::<C>,
            erase: erase_erased::<C>,
            clear: clear_erased::<C>,
            entries: entries_erased::<C>,
        }
    }
}

fn resolve(
    variant: &Variant,
    registry: &TypeRegistry,
) -> (Option<Arc<AssociativeAdapter>>, Type, Type) {
    let ty = variant.get_type(registry);
    let adapter = ty.descriptor().and_then(|d| d.associative.get().cloned());
    let (key_type, value_type) = adapter.as_ref().map_or_else(
        || (Type::invalid(), Type::invalid()),
        |a| {
            (
                registry.get_by_native(a.key_native),
                registry.get_by_native(a.value_native),
            )
        },
    );
    (adapter, key_type, value_type)
}

/// Mutable lens over the associative container held in a variant.
///
/// Created by [`Variant::create_associative_view`]. Inert when the held
/// type was not registered as an associative container.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use reflekt::{TypeRegistry, Variant};
///
/// let registry = TypeRegistry::new();
/// registry
///     .register_associative::<HashMap<String, i32>>("HashMap<String, i32>")
///     .unwrap();
///
/// let mut v = Variant::new(HashMap::from([("a".to_string(), 1i32)]));
/// let mut view = v.create_associative_view(&registry);
/// assert!(view.insert_pair(Variant::from("b"), Variant::new(2i32)));
/// assert_eq!(view.len(), 2);
/// assert_eq!(view.get(&Variant::from("a")).get_value::<i32>(), Some(1));
/// ```
pub struct AssociativeView<'a> {
    variant: &'a mut Variant,
    adapter: Option<Arc<AssociativeAdapter>>,
    key_type: Type,
    value_type: Type,
}

impl<'a> AssociativeView<'a> {
    pub(crate) fn over(variant: &'a mut Variant, registry: &TypeRegistry) -> Self {
        let (adapter, key_type, value_type) = resolve(variant, registry);
        AssociativeView {
            variant,
            adapter,
            key_type,
            value_type,
        }
    }

    /// `true` when the view is backed by a registered associative container.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.adapter.is_some()
    }

    /// `true` for set-like backings storing bare keys.
    #[must_use]
    pub fn is_key_only(&self) -> bool {
        self.adapter.as_ref().is_some_and(|a| a.key_only)
    }

    /// The registered key type.
    #[must_use]
    pub fn key_type(&self) -> Type {
        self.key_type.clone()
    }

    /// The registered mapped-value type (the key type for sets).
    #[must_use]
    pub fn value_type(&self) -> Type {
        self.value_type.clone()
    }

    /// Entry count; `0` for an inert view.
    #[must_use]
    pub fn len(&self) -> usize {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.len)(any).unwrap_or(0),
            _ => 0,
        }
    }

    /// `true` when the container has no entries (or the view is inert).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when `key` is present and holds the key type exactly.
    #[must_use]
    pub fn contains(&self, key: &Variant) -> bool {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.contains)(any, key),
            _ => false,
        }
    }

    /// Copy out the value stored under `key`; empty variant when absent.
    ///
    /// For set-like backings the returned value is the stored key.
    #[must_use]
    pub fn get(&self, key: &Variant) -> Variant {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.find)(any, key),
            _ => Variant::empty(),
        }
    }

    /// Insert a bare key; fails on map-like backings.
    pub fn insert(&mut self, key: Variant) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.insert_key)(any, &key),
            _ => false,
        }
    }

    /// Insert a key/value pair; fails on set-like backings. An existing
    /// entry under the same key is overwritten.
    pub fn insert_pair(&mut self, key: Variant, value: Variant) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.insert_pair)(any, &key, &value),
            _ => false,
        }
    }

    /// Remove the entry under `key`, returning the number removed.
    pub fn erase(&mut self, key: &Variant) -> usize {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.erase)(any, key),
            _ => 0,
        }
    }

    /// Remove all entries.
    pub fn clear(&mut self) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.clear)(any),
            _ => false,
        }
    }

    /// Copy out all entries as key/value variant pairs.
    ///
    /// Iteration order follows the backing container (unordered for the
    /// hash-based ones).
    #[must_use]
    pub fn entries(&self) -> Vec<(Variant, Variant)> {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.entries)(any),
            _ => Vec::new(),
        }
    }
}

/// Read-only counterpart of [`AssociativeView`], created from a shared
/// variant by [`Variant::create_associative_view_ref`].
pub struct AssociativeViewRef<'a> {
    variant: &'a Variant,
    adapter: Option<Arc<AssociativeAdapter>>,
    key_type: Type,
    value_type: Type,
}

impl<'a> AssociativeViewRef<'a> {
    pub(crate) fn over(variant: &'a Variant, registry: &TypeRegistry) -> Self {
        let (adapter, key_type, value_type) = resolve(variant, registry);
        AssociativeViewRef {
            variant,
            adapter,
            key_type,
            value_type,
        }
    }

    /// `true` when the view is backed by a registered associative container.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.adapter.is_some()
    }

    /// `true` for set-like backings storing bare keys.
    #[must_use]
    pub fn is_key_only(&self) -> bool {
        self.adapter.as_ref().is_some_and(|a| a.key_only)
    }

    /// The registered key type.
    #[must_use]
    pub fn key_type(&self) -> Type {
        self.key_type.clone()
    }

    /// The registered mapped-value type (the key type for sets).
    #[must_use]
    pub fn value_type(&self) -> Type {
        self.value_type.clone()
    }

    /// Entry count; `0` for an inert view.
    #[must_use]
    pub fn len(&self) -> usize {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.len)(any).unwrap_or(0),
            _ => 0,
        }
    }

    /// `true` when the container has no entries (or the view is inert).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when `key` is present and holds the key type exactly.
    #[must_use]
    pub fn contains(&self, key: &Variant) -> bool {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.contains)(any, key),
            _ => false,
        }
    }

    /// Copy out the value stored under `key`; empty variant when absent.
    #[must_use]
    pub fn get(&self, key: &Variant) -> Variant {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.find)(any, key),
            _ => Variant::empty(),
        }
    }

    /// Copy out all entries as key/value variant pairs.
    #[must_use]
    pub fn entries(&self) -> Vec<(Variant, Variant)> {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.entries)(any),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_backing_basics() {
        let mut m = HashMap::from([("a".to_string(), 1i32)]);
        assert!(!<HashMap<String, i32> as AssociativeBacking>::KEY_ONLY);
        assert_eq!(m.assoc_len(), 1);
        assert!(m.assoc_insert("b".to_string(), 2));
        assert_eq!(m.assoc_find(&"b".to_string()), Some(2));
        assert!(!m.assoc_insert_key("c".to_string()));
        assert_eq!(m.assoc_erase(&"a".to_string()), 1);
        assert_eq!(m.assoc_erase(&"a".to_string()), 0);
    }

    #[test]
    fn map_insert_overwrites() {
        let mut m = BTreeMap::new();
        assert!(m.assoc_insert(1i32, 10i32));
        assert!(m.assoc_insert(1i32, 20i32));
        assert_eq!(m.assoc_len(), 1);
        assert_eq!(m.assoc_find(&1), Some(20));
    }

    #[test]
    fn set_backing_is_key_only() {
        let mut s = BTreeSet::new();
        assert!(<BTreeSet<i32> as AssociativeBacking>::KEY_ONLY);
        assert!(s.assoc_insert_key(3i32));
        assert!(!s.assoc_insert_key(3i32));
        assert!(!s.assoc_insert(4, 4));
        assert_eq!(s.assoc_find(&3), Some(3));
        assert_eq!(s.assoc_entries(), vec![(3, 3)]);
    }

    #[test]
    fn adapter_erases_correctly() {
        let adapter = AssociativeAdapter::of::<HashMap<String, i32>>();
        let mut container = HashMap::from([("x".to_string(), 7i32)]);
        let any: &mut dyn Any = &mut container;

        assert_eq!((adapter.len)(any), Some(1));
        assert!((adapter.contains)(any, &Variant::from("x")));
        assert_eq!(
            (adapter.find)(any, &Variant::from("x")).get_value::<i32>(),
            Some(7)
        );
        assert!(!(adapter.insert_key)(any, &Variant::from("y")));
        assert!((adapter.insert_pair)(any, &Variant::from("y"), &Variant::new(8i32)));
        assert!(!(adapter.insert_pair)(any, &Variant::from("z"), &Variant::from("bad")));
        assert_eq!((adapter.erase)(any, &Variant::from("x")), 1);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn adapter_key_type_mismatch_fails() {
        let adapter = AssociativeAdapter::of::<BTreeSet<i32>>();
        let mut container = BTreeSet::from([1i32]);
        let any: &mut dyn Any = &mut container;

        assert!(!(adapter.contains)(any, &Variant::from("1")));
        assert_eq!((adapter.erase)(any, &Variant::new(1i64)), 0);
        assert!((adapter.insert_key)(any, &Variant::new(2i32)));
    }
}
