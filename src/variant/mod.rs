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

//! Type-erased value container.
//!
//! [`Variant`] is the universal value of the reflection system: every
//! constructor result, method return, property value, and container element
//! travels as a `Variant`. It can hold a value of any [`ReflectValue`] type,
//! reports its runtime type, and supports deep copies, weak-total
//! comparison, and registry-driven conversion.
//!
//! # Storage
//!
//! Small trivially-copyable values (the arithmetic primitives, `bool`,
//! `char`) are stored inline without allocation; everything else is held in
//! an owned heap allocation behind the per-type [`ReflectValue`] vtable
//! captured at construction. Two distinguished states exist besides held
//! values:
//!
//! - **empty** — the default; `is_valid()` is `false`. Every dispatch
//!   failure in this crate is reported as an empty variant.
//! - **unit** — holds `()`; `is_valid()` is `true`. This is the result of a
//!   successful call whose return value was discarded.
//!
//! # Examples
//!
//! ```rust
//! use reflekt::Variant;
//!
//! let mut v = Variant::new(23i32);
//! assert!(v.is_type::<i32>());
//! assert_eq!(v.get_value::<i32>(), Some(23));
//! assert_eq!(v.get_value::<String>(), None);
//!
//! v = Variant::new(String::from("hello"));
//! assert_eq!(v.get_ref::<String>().map(String::as_str), Some("hello"));
//! ```

mod compare;
mod convert;

use std::{any::Any, fmt};

use crate::{
    convert::builtin,
    types::{Type, TypeRegistry},
    value::ReflectValue,
    views::{
        ArrayView, AssociativeView, AssociativeViewRef, SequentialView, SequentialViewRef,
    },
};

/// Inline storage for the small primitive types.
///
/// Kept unboxed so that numeric-heavy call paths (argument passing,
/// conversion, comparison) never allocate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Inline {
    /// `bool`
    Bool(bool),
    /// `char`
    Char(char),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
}

impl Inline {
    pub(crate) fn as_reflect(&self) -> &dyn ReflectValue {
        match self {
            Inline::Bool(v) => v,
            Inline::Char(v) => v,
            Inline::I8(v) => v,
            Inline::I16(v) => v,
            Inline::I32(v) => v,
            Inline::I64(v) => v,
            Inline::U8(v) => v,
            Inline::U16(v) => v,
            Inline::U32(v) => v,
            Inline::U64(v) => v,
            Inline::F32(v) => v,
            Inline::F64(v) => v,
        }
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        self.as_reflect().as_any()
    }

    pub(crate) fn as_any_mut(&mut self) -> &mut dyn Any {
        match self {
            Inline::Bool(v) => v,
            Inline::Char(v) => v,
            Inline::I8(v) => v,
            Inline::I16(v) => v,
            Inline::I32(v) => v,
            Inline::I64(v) => v,
            Inline::U8(v) => v,
            Inline::U16(v) => v,
            Inline::U32(v) => v,
            Inline::U64(v) => v,
            Inline::F32(v) => v,
            Inline::F64(v) => v,
        }
    }

    fn try_capture(any: &dyn Any) -> Option<Inline> {
        if let Some(v) = any.downcast_ref::<bool>() {
            return Some(Inline::Bool(*v));
        }
        if let Some(v) = any.downcast_ref::<char>() {
            return Some(Inline::Char(*v));
        }
        if let Some(v) = any.downcast_ref::<i8>() {
            return Some(Inline::I8(*v));
        }
        if let Some(v) = any.downcast_ref::<i16>() {
            return Some(Inline::I16(*v));
        }
        if let Some(v) = any.downcast_ref::<i32>() {
            return Some(Inline::I32(*v));
        }
        if let Some(v) = any.downcast_ref::<i64>() {
            return Some(Inline::I64(*v));
        }
        if let Some(v) = any.downcast_ref::<u8>() {
            return Some(Inline::U8(*v));
        }
        if let Some(v) = any.downcast_ref::<u16>() {
            return Some(Inline::U16(*v));
        }
        if let Some(v) = any.downcast_ref::<u32>() {
            return Some(Inline::U32(*v));
        }
        if let Some(v) = any.downcast_ref::<u64>() {
            return Some(Inline::U64(*v));
        }
        if let Some(v) = any.downcast_ref::<f32>() {
            return Some(Inline::F32(*v));
        }
        if let Some(v) = any.downcast_ref::<f64>() {
            return Some(Inline::F64(*v));
        }
        None
    }
}

/// The storage states of a [`Variant`].
pub(crate) enum Storage {
    /// No value; the invalid sentinel state.
    Empty,
    /// Holds `()`; valid.
    Unit,
    /// Unboxed primitive.
    Inline(Inline),
    /// Owned heap value behind its captured vtable.
    Boxed(Box<dyn ReflectValue>),
}

const UNIT_VALUE: () = ();

/// A copyable, type-erased value container.
///
/// See the [module documentation](self) for storage semantics. A `Variant`
/// always owns what it stores: copying a variant never aliases storage with
/// the source (except through a held `Arc`, which shares per the smart
/// pointer's own rules).
pub struct Variant {
    pub(crate) storage: Storage,
}

impl Variant {
    /// Create an empty (invalid) variant.
    #[must_use]
    pub fn empty() -> Self {
        Variant {
            storage: Storage::Empty,
        }
    }

    /// Create a unit variant: valid, holding `()`.
    ///
    /// This is the "call succeeded, no value" result of void invocations.
    #[must_use]
    pub fn unit() -> Self {
        Variant {
            storage: Storage::Unit,
        }
    }

    /// Create a variant holding a copy of `value`.
    ///
    /// Primitive values are stored inline; everything else is boxed behind
    /// the type's [`ReflectValue`] vtable.
    pub fn new<T: ReflectValue>(value: T) -> Self {
        if (&value as &dyn Any).downcast_ref::<()>().is_some() {
            return Variant::unit();
        }
        if let Some(inline) = Inline::try_capture(&value) {
            return Variant {
                storage: Storage::Inline(inline),
            };
        }
        Variant {
            storage: Storage::Boxed(Box::new(value)),
        }
    }

    /// `true` when the variant holds a value (including unit).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self.storage, Storage::Empty)
    }

    /// `true` when the variant holds `()`.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self.storage, Storage::Unit)
    }

    /// The [`std::any::TypeId`] of the held value, if any.
    #[must_use]
    pub fn native_id(&self) -> Option<std::any::TypeId> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Unit => Some(std::any::TypeId::of::<()>()),
            Storage::Inline(inline) => Some(inline.as_any().type_id()),
            Storage::Boxed(boxed) => Some(boxed.as_any().type_id()),
        }
    }

    /// Resolve the held value's registered [`Type`] descriptor.
    ///
    /// Returns an invalid handle for an empty variant or a type that was
    /// never registered.
    #[must_use]
    pub fn get_type(&self, registry: &TypeRegistry) -> Type {
        match self.native_id() {
            Some(native) => registry.get_by_native(native),
            None => Type::invalid(),
        }
    }

    /// Check whether the held value is exactly of type `T`.
    #[must_use]
    pub fn is_type<T: ReflectValue>(&self) -> bool {
        self.native_id() == Some(std::any::TypeId::of::<T>())
    }

    /// Borrow the erased value, if any.
    pub(crate) fn as_reflect(&self) -> Option<&dyn ReflectValue> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Unit => Some(&UNIT_VALUE),
            Storage::Inline(inline) => Some(inline.as_reflect()),
            Storage::Boxed(boxed) => Some(boxed.as_ref()),
        }
    }

    /// Borrow the held value as [`Any`], if any.
    pub(crate) fn as_any(&self) -> Option<&dyn Any> {
        self.as_reflect().map(ReflectValue::as_any)
    }

    /// Mutably borrow the held value as [`Any`], if any.
    ///
    /// A unit variant has no addressable storage and returns `None`.
    pub(crate) fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        match &mut self.storage {
            Storage::Empty | Storage::Unit => None,
            Storage::Inline(inline) => Some(inline.as_any_mut()),
            Storage::Boxed(boxed) => Some(boxed.as_any_mut()),
        }
    }

    /// Borrow the held value as `T`.
    ///
    /// Returns `None` when the variant is empty or holds a different type;
    /// this never panics. Check [`Variant::is_type`] first when the `None`
    /// needs to be distinguished from a held `Option`.
    #[must_use]
    pub fn get_ref<T: ReflectValue>(&self) -> Option<&T> {
        self.as_any().and_then(|any| any.downcast_ref::<T>())
    }

    /// Mutably borrow the held value as `T`.
    #[must_use]
    pub fn get_mut<T: ReflectValue>(&mut self) -> Option<&mut T> {
        self.as_any_mut().and_then(|any| any.downcast_mut::<T>())
    }

    /// Extract a copy of the held value as `T`.
    ///
    /// `T == Variant` is supported: a variant that itself holds a `Variant`
    /// yields a clone of the held one, anything else yields a clone of the
    /// whole variant.
    #[must_use]
    pub fn get_value<T: ReflectValue + Clone>(&self) -> Option<T> {
        if std::any::TypeId::of::<T>() == std::any::TypeId::of::<Variant>() {
            let cloned = match self.get_ref::<Variant>() {
                Some(inner) => inner.clone(),
                None => self.clone(),
            };
            let boxed: Box<dyn Any> = Box::new(cloned);
            return boxed.downcast::<T>().ok().map(|b| *b);
        }
        self.get_ref::<T>().cloned()
    }

    /// Built-in conversion to `bool` without mutating the variant.
    ///
    /// Numeric values convert as `!= 0`; strings trim ASCII whitespace and
    /// map case-insensitive `"false"`, `"0"` and the empty string to
    /// `false`, everything else to `true`.
    #[must_use]
    pub fn to_bool(&self) -> Option<bool> {
        builtin::convert_to::<bool>(self)
    }

    /// Built-in conversion to `i64` without mutating the variant.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        builtin::convert_to::<i64>(self)
    }

    /// Built-in conversion to `i32` without mutating the variant.
    #[must_use]
    pub fn to_i32(&self) -> Option<i32> {
        builtin::convert_to::<i32>(self)
    }

    /// Built-in conversion to `u64` without mutating the variant.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        builtin::convert_to::<u64>(self)
    }

    /// Built-in conversion to `f64` without mutating the variant.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        builtin::convert_to::<f64>(self)
    }

    /// Built-in conversion to a string without mutating the variant.
    ///
    /// `f32` formats with 7 significant digits, `f64` with full precision.
    /// Registered enumeration names are only available through the
    /// registry-aware [`Variant::convert`].
    #[must_use]
    pub fn to_string_repr(&self) -> Option<String> {
        builtin::convert_to::<String>(self)
    }

    /// `true` when the held value's registered type is a fixed-size array.
    #[must_use]
    pub fn is_array(&self, registry: &TypeRegistry) -> bool {
        self.get_type(registry).is_array()
    }

    /// `true` when the held value's registered type is a sequential
    /// container.
    #[must_use]
    pub fn is_sequential_container(&self, registry: &TypeRegistry) -> bool {
        self.get_type(registry).is_sequential_container()
    }

    /// `true` when the held value's registered type is an associative
    /// container.
    #[must_use]
    pub fn is_associative_container(&self, registry: &TypeRegistry) -> bool {
        self.get_type(registry).is_associative_container()
    }

    /// Create a mutable sequential lens over the held container.
    ///
    /// The view is inert (every operation fails) when the held type was not
    /// registered as a sequential container.
    pub fn create_sequential_view<'a>(
        &'a mut self,
        registry: &TypeRegistry,
    ) -> SequentialView<'a> {
        SequentialView::over(self, registry)
    }

    /// Create a read-only sequential lens over the held container.
    #[must_use]
    pub fn create_sequential_view_ref<'a>(
        &'a self,
        registry: &TypeRegistry,
    ) -> SequentialViewRef<'a> {
        SequentialViewRef::over(self, registry)
    }

    /// Create a mutable multi-dimensional array lens over the held value.
    pub fn create_array_view<'a>(&'a mut self, registry: &TypeRegistry) -> ArrayView<'a> {
        ArrayView::over(self, registry)
    }

    /// Create a mutable associative lens over the held container.
    pub fn create_associative_view<'a>(
        &'a mut self,
        registry: &TypeRegistry,
    ) -> AssociativeView<'a> {
        AssociativeView::over(self, registry)
    }

    /// Create a read-only associative lens over the held container.
    #[must_use]
    pub fn create_associative_view_ref<'a>(
        &'a self,
        registry: &TypeRegistry,
    ) -> AssociativeViewRef<'a> {
        AssociativeViewRef::over(self, registry)
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::empty()
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Empty => Storage::Empty,
            Storage::Unit => Storage::Unit,
            Storage::Inline(inline) => Storage::Inline(*inline),
            Storage::Boxed(boxed) => Storage::Boxed(boxed.clone_boxed()),
        };
        Variant { storage }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::Empty => f.write_str("Variant(<empty>)"),
            Storage::Unit => f.write_str("Variant(())"),
            Storage::Inline(inline) => write!(f, "Variant({inline:?})"),
            Storage::Boxed(boxed) => {
                f.write_str("Variant(")?;
                boxed.debug_fmt(f)?;
                f.write_str(")")
            }
        }
    }
}

/// Variants are themselves reflectable, so a declared parameter of type
/// `Variant` accepts any argument unmodified.
impl ReflectValue for Variant {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
    fn clone_boxed(&self) -> Box<dyn ReflectValue> {
        Box::new(self.clone())
    }
    fn partial_eq(&self, other: &dyn ReflectValue) -> Option<bool> {
        other.as_any().downcast_ref::<Variant>().map(|other| self == other)
    }
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

macro_rules! variant_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Variant {
                fn from(value: $t) -> Self {
                    Variant::new(value)
                }
            }
        )*
    };
}

variant_from!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::new(value.to_string())
    }
}

impl From<()> for Variant {
    fn from(_: ()) -> Self {
        Variant::unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_invalid() {
        let v = Variant::empty();
        assert!(!v.is_valid());
        assert_eq!(v.native_id(), None);
        assert_eq!(v.get_value::<i32>(), None);
    }

    #[test]
    fn unit_is_valid() {
        let v = Variant::unit();
        assert!(v.is_valid());
        assert!(v.is_unit());
        assert!(v.is_type::<()>());
    }

    #[test]
    fn round_trip_primitives() {
        assert_eq!(Variant::new(5i32).get_value::<i32>(), Some(5));
        assert_eq!(Variant::new(5u8).get_value::<u8>(), Some(5));
        assert_eq!(Variant::new(2.5f64).get_value::<f64>(), Some(2.5));
        assert_eq!(Variant::new(true).get_value::<bool>(), Some(true));
        assert_eq!(Variant::new('x').get_value::<char>(), Some('x'));
    }

    #[test]
    fn round_trip_boxed() {
        let v = Variant::new(vec![1i32, 2, 3]);
        assert_eq!(v.get_value::<Vec<i32>>(), Some(vec![1, 2, 3]));
        assert!(v.get_value::<Vec<u32>>().is_none());
    }

    #[test]
    fn wrong_type_extraction_fails() {
        let v = Variant::new(5i32);
        assert_eq!(v.get_value::<i64>(), None);
        assert!(v.get_ref::<String>().is_none());
    }

    #[test]
    fn clone_is_deep() {
        let a = Variant::new(vec![1i32, 2]);
        let mut b = a.clone();
        b.get_mut::<Vec<i32>>().unwrap().push(3);
        assert_eq!(a.get_value::<Vec<i32>>(), Some(vec![1, 2]));
        assert_eq!(b.get_value::<Vec<i32>>(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn variant_as_value_of_variant() {
        let inner = Variant::new(9i32);
        let outer = Variant::new(inner);
        assert!(outer.is_type::<Variant>());
        let back = outer.get_value::<Variant>().unwrap();
        assert_eq!(back.get_value::<i32>(), Some(9));
    }

    #[test]
    fn get_value_as_variant_from_any_type() {
        let v = Variant::new(7i32);
        let wrapped = v.get_value::<Variant>().unwrap();
        assert_eq!(wrapped.get_value::<i32>(), Some(7));
    }

    #[test]
    fn mutation_through_get_mut() {
        let mut v = Variant::new(1i32);
        *v.get_mut::<i32>().unwrap() = 2;
        assert_eq!(v.get_value::<i32>(), Some(2));
    }
}
