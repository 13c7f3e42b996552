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

//! The type-erasure seam of the reflection system.
//!
//! Every value that flows through a [`crate::Variant`], an invocation, or a
//! container view is erased behind the [`ReflectValue`] trait. The trait
//! carries the minimal per-type vtable the runtime needs: [`std::any::Any`]
//! access for type-checked downcasting, deep cloning, and optional equality,
//! ordering and debug hooks.
//!
//! # Implementing the trait
//!
//! All primitives, `String`, and the common std containers (`Vec`,
//! `VecDeque`, fixed arrays, `HashMap`, `BTreeMap`, `HashSet`, `BTreeSet`,
//! `Option`, `Arc`) already implement [`ReflectValue`]. For user types, the
//! [`reflect_type!`] macro generates the implementation:
//!
//! ```rust
//! use reflekt::reflect_type;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! reflect_type!(Point: eq);
//! ```
//!
//! The `eq` and `ord` markers opt into the comparison hooks; they require
//! `PartialEq` / `PartialOrd` on the type. A type implemented without `eq`
//! still participates in every operation, it merely compares as "not equal"
//! under the variant's weak equality rules.

use std::{
    any::Any,
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    fmt,
    hash::Hash,
    sync::Arc,
};

/// Object-safe erasure trait for all reflectable values.
///
/// The required methods give the runtime [`Any`] access and deep cloning;
/// the provided methods are optional capability hooks. Implementations are
/// normally generated with [`reflect_type!`] rather than written by hand.
///
/// # Contract
///
/// - `clone_boxed` must produce an independent deep copy (for shared-pointer
///   types such as `Arc<T>`, "deep" follows the pointer's own semantics and
///   shares the pointee).
/// - `partial_eq` / `partial_cmp_value` return `None` when the other value
///   is of a different concrete type or the type has no comparison support.
///   They must never panic.
pub trait ReflectValue: Any + Send + Sync {
    /// Borrow the value as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow the value as [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert the boxed value into a boxed [`Any`].
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Deep-copy the value into a new heap allocation.
    fn clone_boxed(&self) -> Box<dyn ReflectValue>;

    /// Compare for equality with another erased value.
    ///
    /// Returns `None` if the other value has a different concrete type or
    /// this type registered no equality support.
    fn partial_eq(&self, _other: &dyn ReflectValue) -> Option<bool> {
        None
    }

    /// Compare for ordering with another erased value.
    ///
    /// Returns `None` if the other value has a different concrete type, the
    /// values are unordered (e.g. NaN), or this type registered no ordering
    /// support.
    fn partial_cmp_value(&self, _other: &dyn ReflectValue) -> Option<Ordering> {
        None
    }

    /// Format the value for diagnostics.
    ///
    /// The default renders an opaque placeholder; [`reflect_type!`] wires
    /// this to the type's `Debug` implementation.
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", std::any::type_name::<Self>())
    }
}

/// Generates a [`ReflectValue`] implementation for a concrete type.
///
/// Three forms are accepted:
///
/// - `reflect_type!(T)` — clone and debug only (requires `Clone + Debug`)
/// - `reflect_type!(T: eq)` — adds equality (requires `PartialEq`)
/// - `reflect_type!(T: eq, ord)` — adds equality and ordering (requires
///   `PartialEq + PartialOrd`)
#[macro_export]
macro_rules! reflect_type {
    ($t:ty) => {
        impl $crate::ReflectValue for $t {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
            fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::ReflectValue> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }
            fn debug_fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self, f)
            }
        }
    };
    ($t:ty : eq) => {
        impl $crate::ReflectValue for $t {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
            fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::ReflectValue> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }
            fn partial_eq(&self, other: &dyn $crate::ReflectValue) -> ::std::option::Option<bool> {
                other.as_any().downcast_ref::<$t>().map(|other| self == other)
            }
            fn debug_fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self, f)
            }
        }
    };
    ($t:ty : eq, ord) => {
        impl $crate::ReflectValue for $t {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
            fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::ReflectValue> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }
            fn partial_eq(&self, other: &dyn $crate::ReflectValue) -> ::std::option::Option<bool> {
                other.as_any().downcast_ref::<$t>().map(|other| self == other)
            }
            fn partial_cmp_value(
                &self,
                other: &dyn $crate::ReflectValue,
            ) -> ::std::option::Option<::std::cmp::Ordering> {
                other
                    .as_any()
                    .downcast_ref::<$t>()
                    .and_then(|other| ::std::cmp::PartialOrd::partial_cmp(self, other))
            }
            fn debug_fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

reflect_type!((): eq, ord);
reflect_type!(bool: eq, ord);
reflect_type!(char: eq, ord);
reflect_type!(i8: eq, ord);
reflect_type!(i16: eq, ord);
reflect_type!(i32: eq, ord);
reflect_type!(i64: eq, ord);
reflect_type!(u8: eq, ord);
reflect_type!(u16: eq, ord);
reflect_type!(u32: eq, ord);
reflect_type!(u64: eq, ord);
reflect_type!(f32: eq, ord);
reflect_type!(f64: eq, ord);
reflect_type!(String: eq, ord);

impl<T> ReflectValue for Vec<T>
where
    T: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<T> ReflectValue for VecDeque<T>
where
    T: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<T, const N: usize> ReflectValue for [T; N]
where
    T: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<T> ReflectValue for Option<T>
where
    T: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<K, V> ReflectValue for HashMap<K, V>
where
    K: ReflectValue + Clone + Eq + Hash,
    V: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<K, V> ReflectValue for BTreeMap<K, V>
where
    K: ReflectValue + Clone + Ord,
    V: ReflectValue + Clone + PartialEq,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<K> ReflectValue for HashSet<K>
where
    K: ReflectValue + Clone + Eq + Hash,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

impl<K> ReflectValue for BTreeSet<K>
where
    K: ReflectValue + Clone + Ord,
{
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
        other.as_any().downcast_ref::<Self>().map(|other| self == other)
    }
}

/// Boxed values delegate comparison and formatting to the pointee;
/// cloning deep-copies it. Used by the boxed return policy.
impl<T> ReflectValue for Box<T>
where
    T: ReflectValue + Clone,
{
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
        Box::new(Box::new(self.as_ref().clone()))
    }
    fn partial_eq(&self, other: &dyn ReflectValue) -> Option<bool> {
        let other = other.as_any().downcast_ref::<Self>()?;
        self.as_ref().partial_eq(other.as_ref())
    }
    fn partial_cmp_value(&self, other: &dyn ReflectValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<Self>()?;
        self.as_ref().partial_cmp_value(other.as_ref())
    }
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().debug_fmt(f)
    }
}

/// `Arc<T>` is the supported smart-pointer wrapper type.
///
/// Cloning shares the pointee per `Arc` semantics; comparison delegates to
/// the pointee's own hooks.
impl<T> ReflectValue for Arc<T>
where
    T: ReflectValue,
{
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
        Box::new(Arc::clone(self))
    }
    fn partial_eq(&self, other: &dyn ReflectValue) -> Option<bool> {
        let other = other.as_any().downcast_ref::<Self>()?;
        self.as_ref().partial_eq(other.as_ref())
    }
    fn partial_cmp_value(&self, other: &dyn ReflectValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<Self>()?;
        self.as_ref().partial_cmp_value(other.as_ref())
    }
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().debug_fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, PartialOrd)]
    struct Sample(i32);

    reflect_type!(Sample: eq, ord);

    #[test]
    fn clone_boxed_is_deep() {
        let value = Sample(7);
        let cloned = value.clone_boxed();
        assert_eq!(cloned.as_any().downcast_ref::<Sample>(), Some(&Sample(7)));
    }

    #[test]
    fn partial_eq_mismatched_types() {
        let a = Sample(1);
        assert_eq!(a.partial_eq(&5i32), None);
        assert_eq!(a.partial_eq(&Sample(1)), Some(true));
        assert_eq!(a.partial_eq(&Sample(2)), Some(false));
    }

    #[test]
    fn partial_cmp_follows_partial_ord() {
        let a = Sample(1);
        assert_eq!(a.partial_cmp_value(&Sample(2)), Some(Ordering::Less));
        assert_eq!(1.0f64.partial_cmp_value(&f64::NAN), None);
    }

    #[test]
    fn arc_wrapper_shares_pointee() {
        let value = Arc::new(Sample(3));
        let cloned = value.clone_boxed();
        let cloned = cloned.as_any().downcast_ref::<Arc<Sample>>().unwrap();
        assert!(Arc::ptr_eq(&value, cloned));
        assert_eq!(value.partial_eq(cloned), Some(true));
    }
}
