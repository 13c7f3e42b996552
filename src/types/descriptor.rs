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

//! Type descriptors and the public [`Type`] handle.
//!
//! A [`TypeDescriptor`] is the immutable per-type record the registry hands
//! out: stable numeric id, display name, trait flags, base-class
//! registrations with their upcast projections, and the erased adaptors
//! (container views, enumeration data, wrapper unwrapping) captured when
//! the type was registered.
//!
//! User code never holds a descriptor directly; it works with the cheap,
//! clonable [`Type`] handle. An invalid handle (unknown name, retired
//! plugin type) answers every query with an empty/invalid result instead of
//! erroring.

use std::{
    any::Any,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use bitflags::bitflags;
use dashmap::DashMap;

use crate::{
    enumeration::EnumDesc,
    types::ModuleId,
    variant::Variant,
    views::{ArrayAdapter, AssociativeAdapter, SequentialAdapter},
};

/// Stable numeric type id, assigned once per distinct compile-time type for
/// the lifetime of a [`crate::TypeRegistry`].
///
/// Two descriptors for the same compile-time type always carry the same id,
/// no matter how they were obtained (value, name lookup, member signature).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// The invalid sentinel id. Also the "declaring type" bucket for global
    /// (free) methods and properties.
    pub const INVALID: TypeId = TypeId(0);

    pub(crate) const fn new(value: u32) -> Self {
        TypeId(value)
    }

    /// The raw id value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// `true` unless this is [`TypeId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

bitflags! {
    /// Trait flags of a registered type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        /// A user-defined class/struct type.
        const CLASS = 1 << 0;
        /// A registered enumeration.
        const ENUMERATION = 1 << 1;
        /// Any arithmetic primitive (integer or floating point).
        const ARITHMETIC = 1 << 2;
        /// Signed integer primitive.
        const SIGNED_INTEGER = 1 << 3;
        /// Unsigned integer primitive.
        const UNSIGNED_INTEGER = 1 << 4;
        /// Floating-point primitive.
        const FLOATING_POINT = 1 << 5;
        /// `bool`.
        const BOOLEAN = 1 << 6;
        /// `String`.
        const STRING = 1 << 7;
        /// A smart-pointer/reference wrapper (e.g. `Arc<T>`).
        const WRAPPER = 1 << 8;
        /// A fixed-size array type.
        const ARRAY = 1 << 9;
        /// A sequential container (resizable or fixed).
        const SEQUENTIAL_CONTAINER = 1 << 10;
        /// An associative container (map- or set-like).
        const ASSOCIATIVE_CONTAINER = 1 << 11;
        /// One of the built-in primitive types.
        const PRIMITIVE = 1 << 12;
    }
}

/// Projection from a derived value to one of its base values.
///
/// Bases are modeled as composition: the projection returns a reference to
/// the embedded base object. The function is captured per (derived, base)
/// pair at registration time — base placement is never assumed to be a
/// compile-time offset.
pub(crate) type UpcastFn = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Mutable counterpart of [`UpcastFn`].
pub(crate) type UpcastMutFn =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

/// Clone an erased value of this descriptor's type into a fresh variant.
pub(crate) type CloneValueFn = Arc<dyn Fn(&dyn Any) -> Option<Variant> + Send + Sync>;

/// One registered direct base of a type.
pub(crate) struct BaseInfo {
    /// Id of the base type.
    pub base: TypeId,
    /// Shared projection to the embedded base object.
    pub upcast: UpcastFn,
    /// Exclusive projection to the embedded base object.
    pub upcast_mut: UpcastMutFn,
}

/// Immutable per-type record. See the [module documentation](self).
pub struct TypeDescriptor {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) native: std::any::TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) raw: TypeId,
    pub(crate) wrapped: TypeId,
    pub(crate) flags: TypeFlags,
    pub(crate) module: ModuleId,
    pub(crate) retired: AtomicBool,
    /// Direct bases, appended as `register_base` calls arrive.
    pub(crate) bases: boxcar::Vec<BaseInfo>,
    /// Clones an erased value of this type into a variant.
    pub(crate) clone_value: CloneValueFn,
    /// For wrapper types: projects the wrapper onto its pointee.
    pub(crate) unwrap: Option<UpcastFn>,
    pub(crate) sequential: OnceLock<Arc<SequentialAdapter>>,
    pub(crate) associative: OnceLock<Arc<AssociativeAdapter>>,
    pub(crate) array: OnceLock<Arc<ArrayAdapter>>,
    pub(crate) enumeration: OnceLock<Arc<EnumDesc>>,
    pub(crate) metadata: DashMap<String, Variant>,
}

impl TypeDescriptor {
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

/// Cheap, clonable handle to a registered type.
///
/// Obtained from [`crate::TypeRegistry::get`] and friends. An invalid
/// handle never errors: every accessor returns an empty or `false` result.
///
/// # Examples
///
/// ```rust
/// use reflekt::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let ty = registry.get::<i32>();
/// assert!(ty.is_valid());
/// assert!(ty.is_arithmetic());
/// assert_eq!(ty.name(), "i32");
///
/// let unknown = registry.get_by_name("no-such-type");
/// assert!(!unknown.is_valid());
/// assert_eq!(unknown.name(), "");
/// ```
#[derive(Clone, Default)]
pub struct Type {
    pub(crate) inner: Option<Arc<TypeDescriptor>>,
}

impl Type {
    /// The invalid handle.
    #[must_use]
    pub fn invalid() -> Self {
        Type { inner: None }
    }

    pub(crate) fn from_descriptor(descriptor: Arc<TypeDescriptor>) -> Self {
        Type {
            inner: Some(descriptor),
        }
    }

    pub(crate) fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        match &self.inner {
            Some(d) if !d.is_retired() => Some(d),
            _ => None,
        }
    }

    /// `true` when the handle refers to a live registered type.
    ///
    /// Handles to types removed by a module unload flip to invalid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.descriptor().is_some()
    }

    /// The stable numeric id, or [`TypeId::INVALID`].
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.descriptor().map_or(TypeId::INVALID, |d| d.id)
    }

    /// The registered display name, or `""`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor().map_or("", |d| d.name.as_str())
    }

    /// The compile-time type name (`std::any::type_name`), or `""`.
    #[must_use]
    pub fn native_name(&self) -> &str {
        self.descriptor().map_or("", |d| d.type_name)
    }

    /// The [`std::any::TypeId`] of the described type, if valid.
    #[must_use]
    pub fn native(&self) -> Option<std::any::TypeId> {
        self.descriptor().map(|d| d.native)
    }

    /// The trait flags, or the empty set.
    #[must_use]
    pub fn flags(&self) -> TypeFlags {
        self.descriptor().map_or(TypeFlags::empty(), |d| d.flags)
    }

    /// Id of the raw (wrapper-stripped) type; the own id for non-wrappers.
    #[must_use]
    pub fn raw_id(&self) -> TypeId {
        self.descriptor().map_or(TypeId::INVALID, |d| d.raw)
    }

    /// Id of the wrapped type; [`TypeId::INVALID`] for non-wrappers.
    #[must_use]
    pub fn wrapped_id(&self) -> TypeId {
        self.descriptor().map_or(TypeId::INVALID, |d| d.wrapped)
    }

    /// The module this type was registered by.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.descriptor().map_or(ModuleId::MAIN, |d| d.module)
    }

    /// Ids of the directly registered bases.
    #[must_use]
    pub fn base_ids(&self) -> Vec<TypeId> {
        match self.descriptor() {
            Some(d) => d.bases.iter().map(|(_, b)| b.base).collect(),
            None => Vec::new(),
        }
    }

    /// `true` for user-defined class types.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.flags().contains(TypeFlags::CLASS)
    }

    /// `true` for registered enumerations.
    #[must_use]
    pub fn is_enumeration(&self) -> bool {
        self.flags().contains(TypeFlags::ENUMERATION)
    }

    /// `true` for arithmetic primitives.
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        self.flags().contains(TypeFlags::ARITHMETIC)
    }

    /// `true` for smart-pointer wrapper types.
    #[must_use]
    pub fn is_wrapper(&self) -> bool {
        self.flags().contains(TypeFlags::WRAPPER)
    }

    /// `true` for fixed-size array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.flags().contains(TypeFlags::ARRAY)
    }

    /// `true` for sequential containers.
    #[must_use]
    pub fn is_sequential_container(&self) -> bool {
        self.flags().contains(TypeFlags::SEQUENTIAL_CONTAINER)
    }

    /// `true` for associative containers.
    #[must_use]
    pub fn is_associative_container(&self) -> bool {
        self.flags().contains(TypeFlags::ASSOCIATIVE_CONTAINER)
    }

    /// `true` for the built-in primitives.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.flags().contains(TypeFlags::PRIMITIVE)
    }

    /// Attach a metadata value under `key`, overwriting any previous one.
    ///
    /// No-op on an invalid handle.
    pub fn set_metadata(&self, key: &str, value: Variant) {
        if let Some(d) = self.descriptor() {
            d.metadata.insert(key.to_string(), value);
        }
    }

    /// Look up a metadata value by key.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Variant> {
        self.descriptor()
            .and_then(|d| d.metadata.get(key).map(|v| v.clone()))
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.descriptor() {
            Some(d) => write!(f, "Type({}, {})", d.id, d.name),
            None => f.write_str("Type(<invalid>)"),
        }
    }
}
