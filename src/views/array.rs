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

//! Fixed multi-dimensional array views.
//!
//! Arrays up to rank 3 are supported (`[T; N]`, `[[T; N1]; N0]`,
//! `[[[T; N2]; N1]; N0]`). The erased table is captured per concrete array
//! type by [`crate::TypeRegistry::register_array1`] and friends; a partial
//! index path addresses the nested sub-array, a full path addresses one
//! element.

use std::{any::Any, sync::Arc};

use crate::{
    types::{Type, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

/// Erased operation table for one concrete fixed-array type.
pub(crate) struct ArrayAdapter {
    pub(crate) rank: usize,
    pub(crate) dims: Vec<usize>,
    /// Native ids by depth: the array type itself at 0, the element type at
    /// `rank`.
    pub(crate) rank_natives: Vec<std::any::TypeId>,
    get: fn(&dyn Any, &[usize]) -> Variant,
    set: fn(&mut dyn Any, &[usize], &Variant) -> bool,
}

fn get1<T, const N: usize>(any: &dyn Any, index: &[usize]) -> Variant
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_ref::<[T; N]>() else {
        return Variant::empty();
    };
    match index {
        [i] => arr
            .get(*i)
            .map_or_else(Variant::empty, |v| Variant::new(v.clone())),
        _ => Variant::empty(),
    }
}

fn set1<T, const N: usize>(any: &mut dyn Any, index: &[usize], value: &Variant) -> bool
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_mut::<[T; N]>() else {
        return false;
    };
    match index {
        [i] => match (arr.get_mut(*i), value.get_ref::<T>()) {
            (Some(slot), Some(v)) => {
                *slot = v.clone();
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn get2<T, const N0: usize, const N1: usize>(any: &dyn Any, index: &[usize]) -> Variant
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_ref::<[[T; N1]; N0]>() else {
        return Variant::empty();
    };
    match index {
        [i] => arr
            .get(*i)
            .map_or_else(Variant::empty, |row| Variant::new(row.clone())),
        [i, j] => arr
            .get(*i)
            .and_then(|row| row.get(*j))
            .map_or_else(Variant::empty, |v| Variant::new(v.clone())),
        _ => Variant::empty(),
    }
}

fn set2<T, const N0: usize, const N1: usize>(
    any: &mut dyn Any,
    index: &[usize],
    value: &Variant,
) -> bool
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_mut::<[[T; N1]; N0]>() else {
        return false;
    };
    match index {
        [i] => match (arr.get_mut(*i), value.get_ref::<[T; N1]>()) {
            (Some(row), Some(v)) => {
                *row = v.clone();
                true
            }
            _ => false,
        },
        [i, j] => {
            let slot = arr.get_mut(*i).and_then(|row| row.get_mut(*j));
            match (slot, value.get_ref::<T>()) {
                (Some(slot), Some(v)) => {
                    *slot = v.clone();
                    true
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn get3<T, const N0: usize, const N1: usize, const N2: usize>(
    any: &dyn Any,
    index: &[usize],
) -> Variant
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_ref::<[[[T; N2]; N1]; N0]>() else {
        return Variant::empty();
    };
    match index {
        [i] => arr
            .get(*i)
            .map_or_else(Variant::empty, |plane| Variant::new(plane.clone())),
        [i, j] => arr
            .get(*i)
            .and_then(|plane| plane.get(*j))
            .map_or_else(Variant::empty, |row| Variant::new(row.clone())),
        [i, j, k] => arr
            .get(*i)
            .and_then(|plane| plane.get(*j))
            .and_then(|row| row.get(*k))
            .map_or_else(Variant::empty, |v| Variant::new(v.clone())),
        _ => Variant::empty(),
    }
}

fn set3<T, const N0: usize, const N1: usize, const N2: usize>(
    any: &mut dyn Any,
    index: &[usize],
    value: &Variant,
) -> bool
where
    T: ReflectValue + Clone + PartialEq,
{
    let Some(arr) = any.downcast_mut::<[[[T; N2]; N1]; N0]>() else {
        return false;
    };
    match index {
        [i] => match (arr.get_mut(*i), value.get_ref::<[[T; N2]; N1]>()) {
            (Some(plane), Some(v)) => {
                *plane = v.clone();
                true
            }
            _ => false,
        },
        [i, j] => {
            let row = arr.get_mut(*i).and_then(|plane| plane.get_mut(*j));
            match (row, value.get_ref::<[T; N2]>()) {
                (Some(row), Some(v)) => {
                    *row = v.clone();
                    true
                }
                _ => false,
            }
        }
        [i, j, k] => {
            let slot = arr
                .get_mut(*i)
                .and_then(|plane| plane.get_mut(*j))
                .and_then(|row| row.get_mut(*k));
            match (slot, value.get_ref::<T>()) {
                (Some(slot), Some(v)) => {
                    *slot = v.clone();
                    true
                }
                _ => false,
            }
        }
        _ => false,
    }
}

impl ArrayAdapter {
    pub(crate) fn of_rank1<T, const N: usize>() -> Self
    where
        T: ReflectValue + Clone + PartialEq,
    {
        ArrayAdapter {
            rank: 1,
            dims: vec![N],
            rank_natives: vec![
                std::any::TypeId::of::<[T; N]>(),
                std::any::TypeId::of::<T>(),
            ],
            get: get1::<T, N>,
            set: set1::<T, N>,
        }
    }

    pub(crate) fn of_rank2<T, const N0: usize, const N1: usize>() -> Self
    where
        T: ReflectValue + Clone + PartialEq,
    {
        ArrayAdapter {
            rank: 2,
            dims: vec![N0, N1],
            rank_natives: vec![
                std::any::TypeId::of::<[[T; N1]; N0]>(),
                std::any::TypeId::of::<[T; N1]>(),
                std::any::TypeId::of::<T>(),
            ],
            get: get2::<T, N0, N1>,
            set: set2::<T, N0, N1>,
        }
    }

    pub(crate) fn of_rank3<T, const N0: usize, const N1: usize, const N2: usize>() -> Self
    where
        T: ReflectValue + Clone + PartialEq,
    {
        ArrayAdapter {
            rank: 3,
            dims: vec![N0, N1, N2],
            rank_natives: vec![
                std::any::TypeId::of::<[[[T; N2]; N1]; N0]>(),
                std::any::TypeId::of::<[[T; N2]; N1]>(),
                std::any::TypeId::of::<[T; N2]>(),
                std::any::TypeId::of::<T>(),
            ],
            get: get3::<T, N0, N1, N2>,
            set: set3::<T, N0, N1, N2>,
        }
    }
}

/// Lens over the fixed multi-dimensional array held in a variant.
///
/// Created by [`Variant::create_array_view`]. Inert when the held type was
/// not registered as an array. Structural mutation is impossible on fixed
/// arrays, so the view offers no insert/erase; element and sub-array writes
/// go through [`ArrayView::set`].
///
/// # Examples
///
/// ```rust
/// use reflekt::{TypeRegistry, Variant};
///
/// let registry = TypeRegistry::new();
/// registry.register_array2::<i32, 2, 3>("i32[2][3]").unwrap();
///
/// let mut v = Variant::new([[1i32, 2, 3], [4, 5, 6]]);
/// let mut view = v.create_array_view(&registry);
/// assert_eq!(view.rank(), 2);
/// assert_eq!(view.size(&[]), Some(2));
/// assert_eq!(view.size(&[0]), Some(3));
/// assert_eq!(view.get(&[1, 2]).get_value::<i32>(), Some(6));
/// assert!(view.set(&[0, 0], Variant::new(9i32)));
/// ```
pub struct ArrayView<'a> {
    variant: &'a mut Variant,
    adapter: Option<Arc<ArrayAdapter>>,
    rank_types: Vec<Type>,
}

impl<'a> ArrayView<'a> {
    pub(crate) fn over(variant: &'a mut Variant, registry: &TypeRegistry) -> Self {
        let ty = variant.get_type(registry);
        let adapter = ty.descriptor().and_then(|d| d.array.get().cloned());
        let rank_types = adapter.as_ref().map_or_else(Vec::new, |a| {
            a.rank_natives
                .iter()
                .map(|native| registry.get_by_native(*native))
                .collect()
        });
        ArrayView {
            variant,
            adapter,
            rank_types,
        }
    }

    /// `true` when the view is backed by a registered array type.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.adapter.is_some()
    }

    /// Number of dimensions; `0` for an inert view.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.adapter.as_ref().map_or(0, |a| a.rank)
    }

    /// The registered type at nesting `depth`: the array type itself at
    /// depth 0, the element type at depth `rank()`.
    ///
    /// Invalid handle when out of range or the type at that depth was never
    /// registered.
    #[must_use]
    pub fn rank_type(&self, depth: usize) -> Type {
        self.rank_types.get(depth).cloned().unwrap_or_default()
    }

    /// Extent of the dimension addressed by the (possibly empty) index
    /// prefix: `size(&[])` is the outermost extent, `size(&[i])` the extent
    /// one level down, and so on.
    ///
    /// `None` when the prefix is out of bounds or as deep as the array.
    #[must_use]
    pub fn size(&self, prefix: &[usize]) -> Option<usize> {
        let adapter = self.adapter.as_ref()?;
        if prefix.len() >= adapter.rank {
            return None;
        }
        for (depth, index) in prefix.iter().enumerate() {
            if *index >= adapter.dims[depth] {
                return None;
            }
        }
        Some(adapter.dims[prefix.len()])
    }

    /// Copy out the element (full index path) or nested sub-array (partial
    /// path) at `index`; empty variant when out of bounds.
    #[must_use]
    pub fn get(&self, index: &[usize]) -> Variant {
        match (&self.adapter, self.variant.as_any()) {
            (Some(adapter), Some(any)) => (adapter.get)(any, index),
            _ => Variant::empty(),
        }
    }

    /// Overwrite the element or nested sub-array at `index`.
    ///
    /// Fails when the path is out of bounds or `value` does not hold the
    /// addressed type exactly.
    pub fn set(&mut self, index: &[usize], value: Variant) -> bool {
        match (&self.adapter, self.variant.as_any_mut()) {
            (Some(adapter), Some(any)) => (adapter.set)(any, index, &value),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank1_get_set() {
        let adapter = ArrayAdapter::of_rank1::<i32, 4>();
        let mut arr = [1i32, 2, 3, 4];
        let any: &mut dyn Any = &mut arr;

        assert_eq!(adapter.rank, 1);
        assert_eq!(adapter.dims, vec![4]);
        assert_eq!((adapter.get)(any, &[2]).get_value::<i32>(), Some(3));
        assert!((adapter.set)(any, &[0], &Variant::new(9i32)));
        assert!(!(adapter.set)(any, &[4], &Variant::new(9i32)));
        assert!(!(adapter.set)(any, &[0], &Variant::new(9i64)));
        assert_eq!(arr, [9, 2, 3, 4]);
    }

    #[test]
    fn rank2_partial_index_addresses_row() {
        let adapter = ArrayAdapter::of_rank2::<i32, 2, 3>();
        let mut arr = [[1i32, 2, 3], [4, 5, 6]];
        let any: &mut dyn Any = &mut arr;

        let row = (adapter.get)(any, &[1]);
        assert_eq!(row.get_value::<[i32; 3]>(), Some([4, 5, 6]));
        assert_eq!((adapter.get)(any, &[0, 1]).get_value::<i32>(), Some(2));
        assert!((adapter.set)(any, &[0], &Variant::new([7i32, 8, 9])));
        assert_eq!(arr[0], [7, 8, 9]);
    }

    #[test]
    fn rank3_full_path() {
        let adapter = ArrayAdapter::of_rank3::<u8, 2, 2, 2>();
        let mut arr = [[[0u8; 2]; 2]; 2];
        let any: &mut dyn Any = &mut arr;

        assert!((adapter.set)(any, &[1, 0, 1], &Variant::new(5u8)));
        assert_eq!((adapter.get)(any, &[1, 0, 1]).get_value::<u8>(), Some(5));
        assert!(!(adapter.get)(any, &[1, 0, 1, 0]).is_valid());
        assert_eq!(adapter.rank_natives.len(), 4);
    }
}
