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

//! Sequential container views.

use std::{any::Any, collections::VecDeque, sync::Arc};

use crate::{
    types::{Type, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

/// Operations a concrete sequential container exposes to the erased view
/// machinery.
///
/// Implemented for `Vec<T>`, `VecDeque<T>` and `[T; N]`; implement it for a
/// custom container to make it viewable after
/// [`crate::TypeRegistry::register_sequential`]. Fixed-capacity containers
/// set [`SequentialBacking::DYNAMIC`] to `false` and refuse the resizing
/// operations by returning `false`.
pub trait SequentialBacking: ReflectValue {
    /// Element type of the container.
    type Item: ReflectValue + Clone;

    /// `false` for fixed-capacity backings such as `[T; N]`.
    const DYNAMIC: bool;

    /// Current element count.
    fn seq_len(&self) -> usize;
    /// Copy out the element at `index`.
    fn seq_get(&self, index: usize) -> Option<Self::Item>;
    /// Overwrite the element at `index`.
    fn seq_set(&mut self, index: usize, item: Self::Item) -> bool;
    /// Insert `item` before `index` (`index == len` appends).
    fn seq_insert(&mut self, index: usize, item: Self::Item) -> bool;
    /// Remove the element at `index`.
    fn seq_erase(&mut self, index: usize) -> bool;
    /// Remove all elements.
    fn seq_clear(&mut self) -> bool;
    /// Grow or shrink to `size` elements.
    fn seq_resize(&mut self, size: usize) -> bool;
}

impl<T> SequentialBacking for Vec<T>
where
    T: ReflectValue + Clone + Default + PartialEq,
{
    type Item = T;
    const DYNAMIC: bool = true;

    fn seq_len(&self) -> usize {
        self.len()
    }
    fn seq_get(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
    fn seq_set(&mut self, index: usize, item: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
    fn seq_insert(&mut self, index: usize, item: T) -> bool {
        if index > self.len() {
            return false;
        }
        self.insert(index, item);
        true
    }
    fn seq_erase(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.remove(index);
        true
    }
    fn seq_clear(&mut self) -> bool {
        self.clear();
        true
    }
    fn seq_resize(&mut self, size: usize) -> bool {
        self.resize(size, T::default());
        true
    }
}

impl<T> SequentialBacking for VecDeque<T>
where
    T: ReflectValue + Clone + Default + PartialEq,
{
    type Item = T;
    const DYNAMIC: bool = true;

    fn seq_len(&self) -> usize {
        self.len()
    }
    fn seq_get(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
    fn seq_set(&mut self, index: usize, item: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
    fn seq_insert(&mut self, index: usize, item: T) -> bool {
        if index > self.len() {
            return false;
        }
        self.insert(index, item);
        true
    }
    fn seq_erase(&mut self, index: usize) -> bool {
        self.remove(index).is_some()
    }
    fn seq_clear(&mut self) -> bool {
        self.clear();
        true
    }
    fn seq_resize(&mut self, size: usize) -> bool {
        self.resize(size, T::default());
        true
    }
}

/// Fixed arrays support reads and in-place writes only.
impl<T, const N: usize> SequentialBacking for [T; N]
where
    T: ReflectValue + Clone + PartialEq,
{
    type Item = T;
    const DYNAMIC: bool = false;

    fn seq_len(&self) -> usize {
        N
    }
    fn seq_get(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
    fn seq_set(&mut self, index: usize, item: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
    fn seq_insert(&mut self, _index: usize, _item: T) -> bool {
        false
    }
    fn seq_erase(&mut self, _index: usize) -> bool {
        false
    }
    fn seq_clear(&mut self) -> bool {
        false
    }
    fn seq_resize(&mut self, _size: usize) -> bool {
        false
    }
}

/// Erased operation table for one concrete sequential container type.
///
/// Captured once at registration; plain function pointers, no captures.
pub(crate) struct SequentialAdapter {
    pub(crate) dynamic: bool,
    pub(crate) item_native: std::any::TypeId,
    len: fn(&dyn Any) -> Option<usize>,
    get: fn(&dyn Any, usize) -> Variant,
    set: fn(&mut dyn Any, usize, &Variant) -> bool,
    insert: fn(&mut dyn Any, usize, &Variant) -> bool,
    erase: fn(&mut dyn Any, usize) -> bool,
    clear: fn(&mut dyn Any) -> bool,
    resize: fn(&mut dyn Any, usize) -> bool,
}

fn len_erased<C: SequentialBacking>(any: &dyn Any) -> Option<usize> {
    any.downcast_ref::<C>().map(C::seq_len)
}

fn get_erased<C: SequentialBacking>(any: &dyn Any, index: usize) -> Variant {
    any.downcast_ref::<C>()
        .and_then(|c| c.seq_get(index))
        .map_or_else(Variant::empty, Variant::new)
}

fn set_erased<C: SequentialBacking>(any: &mut dyn Any, index: usize, value: &Variant) -> bool {
    let Some(item) = value.get_ref::<C::Item>() else {
        return false;
    };
    let item = item.clone();
    any.downcast_mut::<C>()
        .is_some_and(|c| c.seq_set(index, item))
}

fn insert_erased<C: SequentialBacking>(any: &mut dyn Any, index: usize, value: &Variant) -> bool {
    let Some(item) = value.get_ref::<C::Item>() else {
        return false;
    };
    let item = item.clone();
    any.downcast_mut::<C>()
        .is_some_and(|c| c.seq_insert(index, item))
}

fn erase_erased<C: SequentialBacking>(any: &mut dyn Any, index: usize) -> bool {
    any.downcast_mut::<C>().is_some_and(|c| c.seq_erase(index))
}

fn clear_erased<C: SequentialBacking>(any: &mut dyn Any) -> bool {
    any.downcast_mut::<C>().is_some_and(C::seq_clear)
}

fn resize_erased<C: SequentialBacking>(any: &mut dyn Any, size: usize) -> bool {
    any.downcast_mut::<C>().is_some_and(|c| c.seq_resize(size))
}

impl SequentialAdapter {
    pub(crate) fn of<C: SequentialBacking>() -> Self {
        SequentialAdapter {
            dynamic: C::DYNAMIC,
            item_native: std::any::TypeId::of::<C::Item>(),
            len: len_erased::<C>,
            get: get_erased::<C>,
            set: set_erased::<C>,
            insert: insert_erased::<C>,
            erase: erase_erased::<C>,
            clear: clear_erased::<C>,
            resize: resize_erased::<C>,
        }
    }
}

fn resolve(
    variant: &Variant,
    registry: &TypeRegistry,
) -> (Option<Arc<SequentialAdapter>>, Type) {
    let ty = variant.get_type(registry);
    let adapter = ty.descriptor().and_then(|d| d.sequential.get().cloned());
    let item_type = adapter
        .as_ref()
        .map_or_else(Type::invalid, |a| registry.get_by_native(a.item_native));
    (adapter, item_type)
}

/// Mutable lens over the sequential container held in a variant.
///
/// Created by [`Variant::create_sequential_view`]. Inert (every operation
/// fails, length reads as zero) when the held type was not registered as a
/// sequential container.
///
/// # Examples
///
/// ```rust
/// use reflekt::{TypeRegistry, Variant};
///
/// let registry = TypeRegistry::new();
/// registry.register_sequential::<Vec<i32>>("Vec<i32>").unwrap();
///
/// let mut v = Variant::new(vec![1i32, 2, 3]);
/// let mut view = v.create_sequential_view(&registry);
/// assert_eq!(view.len(), 3);
/// assert!(view.set(0, Variant::new(9i32)));
/// assert!(view.insert(3, Variant::new(4i32)));
/// assert_eq!(v.get_value::<Vec<i32>>(), Some(vec![9, 2, 3, 4]));
/// ```
pub struct SequentialView<'a> {
    variant: &'a mut Variant,
    adapter: Option<Arc<SequentialAdapter>>,
    item_type: Type,
}

impl<'a> SequentialView<'a> {
    pub(crate) fn over(variant: &'a mut Variant, registry: &TypeRegistry) -> Self {
        let (adapter, item_type) = resolve(variant, registry);
        SequentialView {
            variant,
            adapter,
            item_type,
        }
    }

    /// `true` when the view is backed by a registered sequential container.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.adapter.is_some()
    }

    /// `true` when the backing container can grow and shrink.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.adapter.as_ref().is_some_and(|a| a.dynamic)
    }

    /// The registered type of the container's elements.
    #[must_use]
    pub fn value_type(&self) -> Type {
        self.item_type.clone()
    }

    /// Element count; `0` for an inert view.
    #[must_use]
    pub fn len(&self) -> usize {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.len)(any).unwrap_or(0),
            _ => 0,
        }
    }

    /// `true` when the container has no elements (or the view is inert).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the element at `index`; empty variant when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Variant {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.get)(any, index),
            _ => Variant::empty(),
        }
    }

    /// Overwrite the element at `index`.
    ///
    /// Fails when `index` is out of range or `value` does not hold the
    /// element type exactly.
    pub fn set(&mut self, index: usize, value: Variant) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.set)(any, index, &value),
            _ => false,
        }
    }

    /// Insert `value` before `index`; fails on fixed-capacity backings.
    pub fn insert(&mut self, index: usize, value: Variant) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.insert)(any, index, &value),
            _ => false,
        }
    }

    /// Remove the element at `index`; fails on fixed-capacity backings.
    pub fn erase(&mut self, index: usize) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.erase)(any, index),
            _ => false,
        }
    }

    /// Remove all elements; fails on fixed-capacity backings.
    pub fn clear(&mut self) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.clear)(any),
            _ => false,
        }
    }

    /// Grow or shrink the container; fails on fixed-capacity backings.
    ///
    /// New elements are default-constructed.
    pub fn set_size(&mut self, size: usize) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.resize)(any, size),
            _ => false,
        }
    }

    /// Iterate over copies of the elements.
    pub fn iter(&self) -> impl Iterator<Item = Variant> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}

/// Read-only counterpart of [`SequentialView`], created from a shared
/// variant by [`Variant::create_sequential_view_ref`].
pub struct SequentialViewRef<'a> {
    variant: &'a Variant,
    adapter: Option<Arc<SequentialAdapter>>,
    item_type: Type,
}

impl<'a> SequentialViewRef<'a> {
    pub(crate) fn over(variant: &'a Variant, registry: &TypeRegistry) -> Self {
        let (adapter, item_type) = resolve(variant, registry);
        SequentialViewRef {
            variant,
            adapter,
            item_type,
        }
    }

    /// `true` when the view is backed by a registered sequential container.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.adapter.is_some()
    }

    /// `true` when the backing container can grow and shrink.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.adapter.as_ref().is_some_and(|a| a.dynamic)
    }

    /// The registered type of the container's elements.
    #[must_use]
    pub fn value_type(&self) -> Type {
        self.item_type.clone()
    }

    /// Element count; `0` for an inert view.
    #[must_use]
    pub fn len(&self) -> usize {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.len)(any).unwrap_or(0),
            _ => 0,
        }
    }

    /// `true` when the container has no elements (or the view is inert).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the element at `index`; empty variant when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Variant {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.get)(any, index),
            _ => Variant::empty(),
        }
    }

    /// Iterate over copies of the elements.
    pub fn iter(&self) -> impl Iterator<Item = Variant> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_backing_basics() {
        let mut v = vec![1i32, 2, 3];
        assert_eq!(v.seq_len(), 3);
        assert_eq!(v.seq_get(1), Some(2));
        assert!(v.seq_set(0, 9));
        assert!(v.seq_insert(3, 4));
        assert!(v.seq_erase(1));
        assert_eq!(v, vec![9, 3, 4]);
        assert!(v.seq_resize(5));
        assert_eq!(v.seq_len(), 5);
        assert!(v.seq_clear());
        assert!(v.is_empty());
    }

    #[test]
    fn fixed_array_refuses_resizing() {
        let mut a = [1i32, 2, 3];
        assert!(!<[i32; 3] as SequentialBacking>::DYNAMIC);
        assert!(a.seq_set(2, 9));
        assert!(!a.seq_insert(0, 0));
        assert!(!a.seq_erase(0));
        assert!(!a.seq_clear());
        assert!(!a.seq_resize(5));
        assert_eq!(a, [1, 2, 9]);
    }

    #[test]
    fn adapter_erases_correctly() {
        let adapter = SequentialAdapter::of::<Vec<i32>>();
        let mut container = vec![10i32, 20];
        let any: &mut dyn Any = &mut container;

        assert_eq!((adapter.len)(any), Some(2));
        assert_eq!((adapter.get)(any, 1).get_value::<i32>(), Some(20));
        assert!((adapter.set)(any, 0, &Variant::new(5i32)));
        assert!(!(adapter.set)(any, 0, &Variant::new("wrong".to_string())));
        assert!((adapter.insert)(any, 2, &Variant::new(30i32)));
        assert_eq!(container, vec![5, 20, 30]);
    }

    #[test]
    fn adapter_rejects_foreign_container() {
        let adapter = SequentialAdapter::of::<Vec<i32>>();
        let mut wrong = vec![1u8];
        let any: &mut dyn Any = &mut wrong;
        assert_eq!((adapter.len)(any), None);
        assert!(!(adapter.erase)(any, 0));
        assert!(!(adapter.clear)(any));
    }
}
