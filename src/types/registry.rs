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

//! The type registry: the single explicit root object of the reflection
//! system.
//!
//! Everything registered — types, bases, members, converters, enumerations,
//! container adaptors — lives in one [`TypeRegistry`] instance owned by the
//! embedding program. There is no process-global registry: tests and
//! embedders create as many independent registries as they need, and
//! nothing leaks between them.
//!
//! # Thread Safety
//!
//! All lookups and dispatch are lock-free or fine-grained-locked and may
//! run concurrently from any number of threads. Registration must be
//! serialized by the embedder; two unsynchronized `register` calls for the
//! same type may both miss the index probe and allocate duplicate ids.
//! Module load/unload notifications are likewise serialized by the dynamic
//! loader driving them, matching how a loader serializes the library
//! lifecycle itself.

use std::{
    any::Any,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, OnceLock,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    convert::ConverterTable,
    enumeration::{EnumDesc, EnumEntry},
    error::{Error, Result},
    invoke::{Argument, ConstructorDesc, Instance, MethodDesc, PropertyDesc},
    types::{
        descriptor::{BaseInfo, CloneValueFn, TypeDescriptor, UpcastFn},
        ModuleId, Type, TypeFlags, TypeId,
    },
    value::ReflectValue,
    variant::Variant,
    views::{
        ArrayAdapter, AssociativeAdapter, AssociativeBacking, SequentialAdapter,
        SequentialBacking,
    },
};

/// Scope selector for member queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberFilter {
    /// Only members declared directly on the queried type.
    DeclaredOnly,
    /// Members declared on the type and on all its registered bases,
    /// nearest declaration first.
    #[default]
    IncludeBases,
}

/// Members deposited for one declaring type.
///
/// Plain vectors behind the sharded map: member lists are tiny, mutated
/// only during registration and module unload, and cloned out as `Arc`s
/// for lock-free dispatch.
#[derive(Default)]
struct TypeMembers {
    constructors: Vec<(ModuleId, Arc<ConstructorDesc>)>,
    methods: Vec<(ModuleId, Arc<MethodDesc>)>,
    properties: Vec<(ModuleId, Arc<PropertyDesc>)>,
}

fn clone_value_of<T: ReflectValue + Clone>() -> CloneValueFn {
    Arc::new(|any| any.downcast_ref::<T>().map(|value| Variant::new(value.clone())))
}

/// The reflection database. See the [module documentation](self).
///
/// # Examples
///
/// ```rust
/// use reflekt::{reflect_type, Instance, MethodDesc, PropertyDesc, TypeRegistry, Variant};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// reflect_type!(Point: eq);
///
/// let registry = TypeRegistry::new();
/// registry.register::<Point>("Point").unwrap();
/// registry
///     .register_property::<Point>(PropertyDesc::from_field(
///         "x",
///         |p: &Point| &p.x,
///         |p: &mut Point| &mut p.x,
///     ))
///     .unwrap();
///
/// let mut point = Point { x: 1, y: 2 };
/// let inst = Instance::of(&point);
/// let x = registry.get_property_value(&inst, "x");
/// assert_eq!(x.get_value::<i32>(), Some(1));
/// ```
pub struct TypeRegistry {
    /// Primary descriptor storage, ordered by numeric id.
    types: SkipMap<TypeId, Arc<TypeDescriptor>>,
    /// Secondary index: compile-time type id → numeric id.
    by_native: DashMap<std::any::TypeId, TypeId>,
    /// Secondary index: display name → numeric id.
    by_name: DashMap<String, TypeId>,
    /// Members per declaring type; `TypeId::INVALID` holds the globals.
    members: DashMap<TypeId, TypeMembers>,
    converters: ConverterTable,
    loaded_modules: DashMap<ModuleId, ()>,
    /// Module currently attributed with new registrations.
    active_module: AtomicU32,
    /// Next numeric id; 0 is the invalid sentinel.
    next_id: AtomicU32,
}

impl TypeRegistry {
    /// Create a registry with the built-in primitive types installed.
    #[must_use]
    pub fn new() -> Self {
        let registry = TypeRegistry {
            types: SkipMap::new(),
            by_native: DashMap::new(),
            by_name: DashMap::new(),
            members: DashMap::new(),
            converters: ConverterTable::new(),
            loaded_modules: DashMap::new(),
            active_module: AtomicU32::new(ModuleId::MAIN.value()),
            next_id: AtomicU32::new(1),
        };
        super::primitives::install(&registry);
        registry
    }

    fn active_module(&self) -> ModuleId {
        ModuleId::new(self.active_module.load(Ordering::Acquire))
    }

    // ---- type registration -------------------------------------------

    fn insert_descriptor(
        &self,
        name: &str,
        native: std::any::TypeId,
        type_name: &'static str,
        flags: TypeFlags,
        clone_value: CloneValueFn,
        unwrap: Option<UpcastFn>,
        wrapped: TypeId,
    ) -> Result<Type> {
        if let Some(id) = self.by_native.get(&native).map(|entry| *entry) {
            let existing = self.get_by_id(id);
            if existing.is_valid() {
                return Ok(existing);
            }
            // A retired id left over from a module unload; fall through and
            // register afresh under a new id.
        }
        if let Some(taken) = self.by_name.get(name).map(|entry| *entry) {
            if let Some(desc) = self.descriptor_of(taken) {
                if desc.native != native {
                    return Err(Error::DuplicateTypeName {
                        name: name.to_string(),
                    });
                }
            }
        }

        let id = TypeId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let raw = match self.descriptor_of(wrapped) {
            Some(inner) => inner.raw,
            None => id,
        };
        let descriptor = Arc::new(TypeDescriptor {
            id,
            name: name.to_string(),
            native,
            type_name,
            raw,
            wrapped,
            flags,
            module: self.active_module(),
            retired: AtomicBool::new(false),
            bases: boxcar::Vec::new(),
            clone_value,
            unwrap,
            sequential: OnceLock::new(),
            associative: OnceLock::new(),
            array: OnceLock::new(),
            enumeration: OnceLock::new(),
            metadata: DashMap::new(),
        });
        self.types.insert(id, descriptor.clone());
        self.by_native.insert(native, id);
        self.by_name.insert(name.to_string(), id);
        Ok(Type::from_descriptor(descriptor))
    }

    pub(crate) fn register_builtin<T: ReflectValue + Clone>(&self, name: &str, flags: TypeFlags) {
        let _ = self.insert_descriptor(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            flags,
            clone_value_of::<T>(),
            None,
            TypeId::INVALID,
        );
    }

    /// Register a class type under a display name.
    ///
    /// Registering the same compile-time type twice is idempotent and
    /// returns the existing handle; registering a *different* type under an
    /// already-taken name fails.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register<T: ReflectValue + Clone>(&self, name: &str) -> Result<Type> {
        self.insert_descriptor(
            name,
            std::any::TypeId::of::<T>(),
            std::any::type_name::<T>(),
            TypeFlags::CLASS,
            clone_value_of::<T>(),
            None,
            TypeId::INVALID,
        )
    }

    /// Register an enumeration with its enumerator list.
    ///
    /// `underlying` extracts the underlying integer value, normalized to
    /// `i64` (`|e| *e as i64` for a plain C-like enum).
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_enumeration<E, F>(
        &self,
        name: &str,
        entries: Vec<(&str, E)>,
        underlying: F,
    ) -> Result<Type>
    where
        E: ReflectValue + Clone,
        F: Fn(&E) -> i64 + Send + Sync + 'static,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<E>(),
            std::any::type_name::<E>(),
            TypeFlags::ENUMERATION,
            clone_value_of::<E>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let list = boxcar::Vec::new();
            for (entry_name, value) in entries {
                list.push(EnumEntry {
                    name: entry_name.to_string(),
                    value: underlying(&value),
                    prototype: Variant::new(value),
                });
            }
            let _ = descriptor.enumeration.set(Arc::new(EnumDesc {
                owner: descriptor.id,
                entries: list,
                to_underlying: Arc::new(move |any| any.downcast_ref::<E>().map(|e| underlying(e))),
            }));
        }
        Ok(ty)
    }

    /// Register a sequential container type, capturing its view adaptor.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_sequential<C>(&self, name: &str) -> Result<Type>
    where
        C: SequentialBacking + Clone,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<C>(),
            std::any::type_name::<C>(),
            TypeFlags::SEQUENTIAL_CONTAINER,
            clone_value_of::<C>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let _ = descriptor
                .sequential
                .set(Arc::new(SequentialAdapter::of::<C>()));
        }
        Ok(ty)
    }

    /// Register an associative container type, capturing its view adaptor.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_associative<C>(&self, name: &str) -> Result<Type>
    where
        C: AssociativeBacking + Clone,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<C>(),
            std::any::type_name::<C>(),
            TypeFlags::ASSOCIATIVE_CONTAINER,
            clone_value_of::<C>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let _ = descriptor
                .associative
                .set(Arc::new(AssociativeAdapter::of::<C>()));
        }
        Ok(ty)
    }

    /// Register a one-dimensional fixed array `[T; N]`.
    ///
    /// The type is viewable both as an array and sequentially (with the
    /// resizing operations refused).
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_array1<T, const N: usize>(&self, name: &str) -> Result<Type>
    where
        T: ReflectValue + Clone + PartialEq,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<[T; N]>(),
            std::any::type_name::<[T; N]>(),
            TypeFlags::ARRAY | TypeFlags::SEQUENTIAL_CONTAINER,
            clone_value_of::<[T; N]>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let _ = descriptor.array.set(Arc::new(ArrayAdapter::of_rank1::<T, N>()));
            let _ = descriptor
                .sequential
                .set(Arc::new(SequentialAdapter::of::<[T; N]>()));
        }
        Ok(ty)
    }

    /// Register a two-dimensional fixed array `[[T; N1]; N0]`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_array2<T, const N0: usize, const N1: usize>(&self, name: &str) -> Result<Type>
    where
        T: ReflectValue + Clone + PartialEq,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<[[T; N1]; N0]>(),
            std::any::type_name::<[[T; N1]; N0]>(),
            TypeFlags::ARRAY | TypeFlags::SEQUENTIAL_CONTAINER,
            clone_value_of::<[[T; N1]; N0]>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let _ = descriptor
                .array
                .set(Arc::new(ArrayAdapter::of_rank2::<T, N0, N1>()));
            let _ = descriptor
                .sequential
                .set(Arc::new(SequentialAdapter::of::<[[T; N1]; N0]>()));
        }
        Ok(ty)
    }

    /// Register a three-dimensional fixed array `[[[T; N2]; N1]; N0]`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_array3<T, const N0: usize, const N1: usize, const N2: usize>(
        &self,
        name: &str,
    ) -> Result<Type>
    where
        T: ReflectValue + Clone + PartialEq,
    {
        let ty = self.insert_descriptor(
            name,
            std::any::TypeId::of::<[[[T; N2]; N1]; N0]>(),
            std::any::type_name::<[[[T; N2]; N1]; N0]>(),
            TypeFlags::ARRAY | TypeFlags::SEQUENTIAL_CONTAINER,
            clone_value_of::<[[[T; N2]; N1]; N0]>(),
            None,
            TypeId::INVALID,
        )?;
        if let Some(descriptor) = ty.descriptor() {
            let _ = descriptor
                .array
                .set(Arc::new(ArrayAdapter::of_rank3::<T, N0, N1, N2>()));
            let _ = descriptor
                .sequential
                .set(Arc::new(SequentialAdapter::of::<[[[T; N2]; N1]; N0]>()));
        }
        Ok(ty)
    }

    /// Register `Arc<T>` as a wrapper around the already-registered `T`.
    ///
    /// Dispatch and conversion see through the wrapper: an `Arc<T>` receiver
    /// reaches methods of `T`, and a variant holding `Arc<T>` converts to
    /// `T`.
    ///
    /// # Errors
    ///
    /// [`Error::TypeNotRegistered`] when `T` itself is not registered,
    /// [`Error::DuplicateTypeName`] when `name` is taken by another type.
    pub fn register_shared<T>(&self, name: &str) -> Result<Type>
    where
        T: ReflectValue,
    {
        let wrapped = self.get::<T>();
        if !wrapped.is_valid() {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<T>().to_string(),
            });
        }
        let unwrap: UpcastFn =
            Arc::new(|any| any.downcast_ref::<Arc<T>>().map(|arc| arc.as_ref() as &dyn Any));
        self.insert_descriptor(
            name,
            std::any::TypeId::of::<Arc<T>>(),
            std::any::type_name::<Arc<T>>(),
            TypeFlags::WRAPPER,
            clone_value_of::<Arc<T>>(),
            Some(unwrap),
            wrapped.id(),
        )
    }

    /// Register `B` as a direct base of `D` with its projection pair.
    ///
    /// Bases are modeled as composition: the projections return the
    /// embedded base object, so placement is whatever the projections say —
    /// multiple bases and diamonds are fine.
    ///
    /// # Errors
    ///
    /// [`Error::TypeNotRegistered`] when either type is not registered.
    pub fn register_base<D, B>(
        &self,
        shared: fn(&D) -> &B,
        exclusive: fn(&mut D) -> &mut B,
    ) -> Result<()>
    where
        D: ReflectValue,
        B: ReflectValue,
    {
        let derived = self.get::<D>();
        let Some(derived_desc) = derived.descriptor().cloned() else {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<D>().to_string(),
            });
        };
        let base = self.get::<B>();
        if !base.is_valid() {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<B>().to_string(),
            });
        }
        if derived_desc.bases.iter().any(|(_, b)| b.base == base.id()) {
            return Ok(());
        }
        derived_desc.bases.push(BaseInfo {
            base: base.id(),
            upcast: Arc::new(move |any| any.downcast_ref::<D>().map(|d| shared(d) as &dyn Any)),
            upcast_mut: Arc::new(move |any| {
                any.downcast_mut::<D>().map(|d| exclusive(d) as &mut dyn Any)
            }),
        });
        Ok(())
    }

    // ---- member registration -----------------------------------------

    /// Deposit a constructor for `Owner`.
    ///
    /// Re-registering the same parameter signature is a no-op: the first
    /// registration and its module attribution stay in place.
    ///
    /// # Errors
    ///
    /// [`Error::TypeNotRegistered`] when `Owner` is not registered.
    pub fn register_constructor<Owner: ReflectValue>(
        &self,
        mut constructor: ConstructorDesc,
    ) -> Result<()> {
        let ty = self.get::<Owner>();
        let Some(descriptor) = ty.descriptor() else {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<Owner>().to_string(),
            });
        };
        constructor.declaring = descriptor.id;
        let signature = constructor.signature_natives();
        let module = self.active_module();
        let mut members = self.members.entry(descriptor.id).or_default();
        if members
            .constructors
            .iter()
            .any(|(_, c)| c.signature_natives() == signature)
        {
            return Ok(());
        }
        members.constructors.push((module, Arc::new(constructor)));
        Ok(())
    }

    /// Deposit a method for `Owner`.
    ///
    /// A different signature under the same name adds an overload;
    /// re-registering an existing name and parameter signature is a no-op,
    /// keeping the first registration and its module attribution.
    ///
    /// # Errors
    ///
    /// [`Error::TypeNotRegistered`] when `Owner` is not registered.
    pub fn register_method<Owner: ReflectValue>(&self, mut method: MethodDesc) -> Result<()> {
        let ty = self.get::<Owner>();
        let Some(descriptor) = ty.descriptor() else {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<Owner>().to_string(),
            });
        };
        method.declaring = descriptor.id;
        let signature = method.signature_natives();
        let module = self.active_module();
        let mut members = self.members.entry(descriptor.id).or_default();
        if members
            .methods
            .iter()
            .any(|(_, m)| m.name() == method.name() && m.signature_natives() == signature)
        {
            return Ok(());
        }
        members.methods.push((module, Arc::new(method)));
        Ok(())
    }

    /// Deposit a free function, owned by no type.
    ///
    /// Re-registering an existing name and parameter signature is a no-op.
    pub fn register_global_method(&self, method: MethodDesc) {
        let signature = method.signature_natives();
        let module = self.active_module();
        let mut members = self.members.entry(TypeId::INVALID).or_default();
        if members
            .methods
            .iter()
            .any(|(_, m)| m.name() == method.name() && m.signature_natives() == signature)
        {
            return;
        }
        members.methods.push((module, Arc::new(method)));
    }

    /// Deposit a property for `Owner`.
    ///
    /// Re-registering an existing name is a no-op, keeping the first
    /// registration and its module attribution.
    ///
    /// # Errors
    ///
    /// [`Error::TypeNotRegistered`] when `Owner` is not registered.
    pub fn register_property<Owner: ReflectValue>(&self, mut property: PropertyDesc) -> Result<()> {
        let ty = self.get::<Owner>();
        let Some(descriptor) = ty.descriptor() else {
            return Err(Error::TypeNotRegistered {
                name: std::any::type_name::<Owner>().to_string(),
            });
        };
        property.declaring = descriptor.id;
        let module = self.active_module();
        let mut members = self.members.entry(descriptor.id).or_default();
        if members.properties.iter().any(|(_, p)| p.name() == property.name()) {
            return Ok(());
        }
        members.properties.push((module, Arc::new(property)));
        Ok(())
    }

    /// Deposit a global property, owned by no type.
    ///
    /// Re-registering an existing name is a no-op.
    pub fn register_global_property(&self, property: PropertyDesc) {
        let module = self.active_module();
        let mut members = self.members.entry(TypeId::INVALID).or_default();
        if members.properties.iter().any(|(_, p)| p.name() == property.name()) {
            return;
        }
        members.properties.push((module, Arc::new(property)));
    }

    /// Register a conversion function from `S` to `T`, attributed to the
    /// active module.
    pub fn register_converter<S, T, F>(&self, converter: F)
    where
        S: ReflectValue,
        T: ReflectValue,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        self.converters
            .register_for_module(self.active_module(), converter);
    }

    /// The user-converter table.
    #[must_use]
    pub fn converter_table(&self) -> &ConverterTable {
        &self.converters
    }

    // ---- type lookup -------------------------------------------------

    /// Resolve the handle of a compile-time type.
    #[must_use]
    pub fn get<T: ReflectValue>(&self) -> Type {
        self.get_by_native(std::any::TypeId::of::<T>())
    }

    /// Resolve a handle by numeric id.
    #[must_use]
    pub fn get_by_id(&self, id: TypeId) -> Type {
        match self.types.get(&id) {
            Some(entry) if !entry.value().is_retired() => {
                Type::from_descriptor(entry.value().clone())
            }
            _ => Type::invalid(),
        }
    }

    /// Resolve a handle by registered display name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Type {
        match self.by_name.get(name).map(|entry| *entry) {
            Some(id) => self.get_by_id(id),
            None => Type::invalid(),
        }
    }

    /// Resolve a handle by [`std::any::TypeId`].
    #[must_use]
    pub fn get_by_native(&self, native: std::any::TypeId) -> Type {
        match self.by_native.get(&native).map(|entry| *entry) {
            Some(id) => self.get_by_id(id),
            None => Type::invalid(),
        }
    }

    /// All live registered types, ordered by numeric id.
    #[must_use]
    pub fn type_list(&self) -> Vec<Type> {
        self.types
            .iter()
            .filter(|entry| !entry.value().is_retired())
            .map(|entry| Type::from_descriptor(entry.value().clone()))
            .collect()
    }

    /// The enumeration data of a registered enum type.
    #[must_use]
    pub fn enumeration(&self, ty: &Type) -> Option<Arc<EnumDesc>> {
        ty.descriptor().and_then(|d| d.enumeration.get().cloned())
    }

    pub(crate) fn descriptor_of(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        match self.types.get(&id) {
            Some(entry) if !entry.value().is_retired() => Some(entry.value().clone()),
            _ => None,
        }
    }

    // ---- inheritance -------------------------------------------------

    /// `true` when `derived` is `base` itself or transitively registered as
    /// derived from it. Diamonds are walked once.
    #[must_use]
    pub fn is_derived_from(&self, derived: &Type, base: &Type) -> bool {
        if !derived.is_valid() || !base.is_valid() {
            return false;
        }
        if derived.id() == base.id() {
            return true;
        }
        self.upcast_path(derived.id(), base.id()).is_some()
    }

    /// Depth-first search for a projection chain from `source` to `target`.
    fn upcast_path(&self, source: TypeId, target: TypeId) -> Option<Vec<(Arc<TypeDescriptor>, usize)>> {
        let descriptor = self.descriptor_of(source)?;
        let mut visited = vec![source];
        let mut path = Vec::new();
        if self.find_path(&descriptor, target, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn find_path(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        target: TypeId,
        visited: &mut Vec<TypeId>,
        path: &mut Vec<(Arc<TypeDescriptor>, usize)>,
    ) -> bool {
        for (index, base) in descriptor.bases.iter() {
            if visited.contains(&base.base) {
                continue;
            }
            visited.push(base.base);
            path.push((descriptor.clone(), index));
            if base.base == target {
                return true;
            }
            if let Some(base_desc) = self.descriptor_of(base.base) {
                if self.find_path(&base_desc, target, visited, path) {
                    return true;
                }
            }
            path.pop();
        }
        false
    }

    /// Project a shared erased value onto `target`: identity, then wrapper
    /// unwrapping, then base upcasts.
    pub(crate) fn project_shared<'a>(
        &self,
        any: &'a dyn Any,
        target: TypeId,
    ) -> Option<&'a dyn Any> {
        let source = self.by_native.get(&any.type_id()).map(|entry| *entry)?;
        if source == target {
            return Some(any);
        }
        if let Some(descriptor) = self.descriptor_of(source) {
            if let Some(unwrap) = &descriptor.unwrap {
                if let Some(inner) = unwrap(any) {
                    if let Some(found) = self.project_shared(inner, target) {
                        return Some(found);
                    }
                }
            }
        }
        let path = self.upcast_path(source, target)?;
        let mut current = any;
        for (descriptor, index) in path {
            let base = descriptor.bases.get(index)?;
            current = (base.upcast)(current)?;
        }
        Some(current)
    }

    /// Shared receiver resolution used by dispatch.
    pub(crate) fn upcast_to<'a, C: 'static>(&self, any: &'a dyn Any) -> Option<&'a C> {
        let target = self
            .by_native
            .get(&std::any::TypeId::of::<C>())
            .map(|entry| *entry)?;
        self.project_shared(any, target)?.downcast_ref::<C>()
    }

    /// Mutable receiver resolution. Wrappers are read-only, so only base
    /// projections apply.
    pub(crate) fn upcast_mut_to<'a, C: 'static>(&self, any: &'a mut dyn Any) -> Option<&'a mut C> {
        let target = self
            .by_native
            .get(&std::any::TypeId::of::<C>())
            .map(|entry| *entry)?;
        let source = self.by_native.get(&(*any).type_id()).map(|entry| *entry)?;
        if source == target {
            return any.downcast_mut::<C>();
        }
        let path = self.upcast_path(source, target)?;
        let mut current = any;
        for (descriptor, index) in path {
            let base = descriptor.bases.get(index)?;
            current = (base.upcast_mut)(current)?;
        }
        current.downcast_mut::<C>()
    }

    /// The queried type followed by its transitive bases, nearest first,
    /// each visited once. Wrappers contribute their pointee's chain, so
    /// member lookup on `Arc<T>` resolves the members of `T`.
    fn base_chain(&self, id: TypeId) -> Vec<TypeId> {
        if !id.is_valid() {
            return Vec::new();
        }
        let mut chain = vec![id];
        let mut cursor = 0;
        while cursor < chain.len() {
            if let Some(descriptor) = self.descriptor_of(chain[cursor]) {
                if descriptor.wrapped.is_valid() && !chain.contains(&descriptor.wrapped) {
                    chain.push(descriptor.wrapped);
                }
                for (_, base) in descriptor.bases.iter() {
                    if !chain.contains(&base.base) {
                        chain.push(base.base);
                    }
                }
            }
            cursor += 1;
        }
        chain
    }

    // ---- member queries ----------------------------------------------

    fn constructors_declared(&self, owner: TypeId) -> Vec<Arc<ConstructorDesc>> {
        self.members.get(&owner).map_or_else(Vec::new, |members| {
            members.constructors.iter().map(|(_, c)| c.clone()).collect()
        })
    }

    fn methods_declared(&self, owner: TypeId) -> Vec<Arc<MethodDesc>> {
        self.members.get(&owner).map_or_else(Vec::new, |members| {
            members.methods.iter().map(|(_, m)| m.clone()).collect()
        })
    }

    fn properties_declared(&self, owner: TypeId) -> Vec<Arc<PropertyDesc>> {
        self.members.get(&owner).map_or_else(Vec::new, |members| {
            members.properties.iter().map(|(_, p)| p.clone()).collect()
        })
    }

    /// The constructors registered for a type, in registration order.
    ///
    /// Constructors are never inherited.
    #[must_use]
    pub fn constructors(&self, ty: &Type) -> Vec<Arc<ConstructorDesc>> {
        self.constructors_declared(ty.id())
    }

    /// The constructor with the exact parameter signature, if any.
    #[must_use]
    pub fn get_constructor(
        &self,
        ty: &Type,
        signature: &[std::any::TypeId],
    ) -> Option<Arc<ConstructorDesc>> {
        self.constructors_declared(ty.id())
            .into_iter()
            .find(|c| c.matches_signature(signature))
    }

    /// The methods visible on a type under the given filter.
    #[must_use]
    pub fn methods(&self, ty: &Type, filter: MemberFilter) -> Vec<Arc<MethodDesc>> {
        let owners = match filter {
            MemberFilter::DeclaredOnly => vec![ty.id()],
            MemberFilter::IncludeBases => self.base_chain(ty.id()),
        };
        owners
            .into_iter()
            .flat_map(|owner| self.methods_declared(owner))
            .collect()
    }

    /// The first method with the given name, nearest declaration first.
    #[must_use]
    pub fn get_method(&self, ty: &Type, name: &str) -> Option<Arc<MethodDesc>> {
        self.base_chain(ty.id()).into_iter().find_map(|owner| {
            self.methods_declared(owner)
                .into_iter()
                .find(|m| m.name() == name)
        })
    }

    /// The method with the given name and exact parameter signature.
    #[must_use]
    pub fn get_method_with_signature(
        &self,
        ty: &Type,
        name: &str,
        signature: &[std::any::TypeId],
    ) -> Option<Arc<MethodDesc>> {
        self.base_chain(ty.id()).into_iter().find_map(|owner| {
            self.methods_declared(owner)
                .into_iter()
                .find(|m| m.name() == name && m.matches_signature(signature))
        })
    }

    /// The properties visible on a type under the given filter.
    #[must_use]
    pub fn properties(&self, ty: &Type, filter: MemberFilter) -> Vec<Arc<PropertyDesc>> {
        let owners = match filter {
            MemberFilter::DeclaredOnly => vec![ty.id()],
            MemberFilter::IncludeBases => self.base_chain(ty.id()),
        };
        owners
            .into_iter()
            .flat_map(|owner| self.properties_declared(owner))
            .collect()
    }

    /// The first property with the given name, nearest declaration first.
    #[must_use]
    pub fn get_property(&self, ty: &Type, name: &str) -> Option<Arc<PropertyDesc>> {
        self.base_chain(ty.id()).into_iter().find_map(|owner| {
            self.properties_declared(owner)
                .into_iter()
                .find(|p| p.name() == name)
        })
    }

    /// The registered free functions.
    #[must_use]
    pub fn global_methods(&self) -> Vec<Arc<MethodDesc>> {
        self.methods_declared(TypeId::INVALID)
    }

    /// The first free function with the given name.
    #[must_use]
    pub fn get_global_method(&self, name: &str) -> Option<Arc<MethodDesc>> {
        self.global_methods().into_iter().find(|m| m.name() == name)
    }

    /// The registered global properties.
    #[must_use]
    pub fn global_properties(&self) -> Vec<Arc<PropertyDesc>> {
        self.properties_declared(TypeId::INVALID)
    }

    /// The global property with the given name.
    #[must_use]
    pub fn get_global_property(&self, name: &str) -> Option<Arc<PropertyDesc>> {
        self.global_properties()
            .into_iter()
            .find(|p| p.name() == name)
    }

    // ---- dispatch conveniences ---------------------------------------

    /// Construct an instance of `ty`, trying its constructors in
    /// registration order; empty variant when none accepts `args`.
    #[must_use]
    pub fn create(&self, ty: &Type, args: &[Variant]) -> Variant {
        for constructor in self.constructors_declared(ty.id()) {
            if constructor.accepts(args) {
                return constructor.invoke(self, args);
            }
        }
        Variant::empty()
    }

    /// [`TypeRegistry::create`] by registered type name.
    #[must_use]
    pub fn create_by_name(&self, name: &str, args: &[Variant]) -> Variant {
        self.create(&self.get_by_name(name), args)
    }

    /// Invoke the first matching method named `name` on the instance's
    /// type or its bases; empty variant when nothing matches.
    pub fn invoke(&self, instance: &mut Instance<'_>, name: &str, args: &[Variant]) -> Variant {
        let ty = instance.get_type(self);
        for owner in self.base_chain(ty.id()) {
            for method in self.methods_declared(owner) {
                if method.name() == name && method.accepts(args) {
                    return method.invoke(self, instance, args);
                }
            }
        }
        Variant::empty()
    }

    /// Invoke a static (associated) method of `ty` with the unit receiver.
    #[must_use]
    pub fn invoke_static(&self, ty: &Type, name: &str, args: &[Variant]) -> Variant {
        let mut unit = Instance::Unit;
        for owner in self.base_chain(ty.id()) {
            for method in self.methods_declared(owner) {
                if method.name() == name && method.is_static() && method.accepts(args) {
                    return method.invoke(self, &mut unit, args);
                }
            }
        }
        Variant::empty()
    }

    /// Invoke a registered free function; empty variant when nothing
    /// matches.
    #[must_use]
    pub fn invoke_global(&self, name: &str, args: &[Variant]) -> Variant {
        let mut unit = Instance::Unit;
        for method in self.global_methods() {
            if method.name() == name && method.accepts(args) {
                return method.invoke(self, &mut unit, args);
            }
        }
        Variant::empty()
    }

    /// Read the property named `name` from the instance's type or bases.
    #[must_use]
    pub fn get_property_value(&self, instance: &Instance<'_>, name: &str) -> Variant {
        let ty = instance.get_type(self);
        match self.get_property(&ty, name) {
            Some(property) => property.get_value(self, instance),
            None => Variant::empty(),
        }
    }

    /// Write the property named `name` on the instance's type or bases.
    pub fn set_property_value(
        &self,
        instance: &mut Instance<'_>,
        name: &str,
        value: &Argument<'_>,
    ) -> bool {
        let ty = instance.get_type(self);
        match self.get_property(&ty, name) {
            Some(property) => property.set_value(self, instance, value),
            None => false,
        }
    }

    // ---- module lifecycle --------------------------------------------

    /// `true` when the plugin module is currently loaded.
    #[must_use]
    pub fn is_module_loaded(&self, module: ModuleId) -> bool {
        self.loaded_modules.contains_key(&module)
    }

    /// Run a plugin module's registration code with its registrations
    /// attributed to `module`.
    ///
    /// The loader calls this after its dlopen equivalent succeeds; every
    /// registration made inside `register` is removed again by
    /// [`TypeRegistry::notify_module_unloaded`].
    ///
    /// # Errors
    ///
    /// [`Error::ModuleAlreadyLoaded`] for a duplicate load (or for
    /// [`ModuleId::MAIN`], which is always loaded), plus whatever
    /// `register` itself returns.
    pub fn notify_module_loaded<F>(&self, module: ModuleId, register: F) -> Result<()>
    where
        F: FnOnce(&TypeRegistry) -> Result<()>,
    {
        if !module.is_plugin() || self.loaded_modules.insert(module, ()).is_some() {
            return Err(Error::ModuleAlreadyLoaded { module });
        }
        self.active_module.store(module.value(), Ordering::Release);
        let result = register(self);
        self.active_module
            .store(ModuleId::MAIN.value(), Ordering::Release);
        result
    }

    /// Remove every registration attributed to `module` and invalidate all
    /// outstanding handles to its types.
    ///
    /// # Errors
    ///
    /// [`Error::ModuleNotLoaded`] when the module is not loaded.
    pub fn notify_module_unloaded(&self, module: ModuleId) -> Result<()> {
        if self.loaded_modules.remove(&module).is_none() {
            return Err(Error::ModuleNotLoaded { module });
        }

        let mut retired = Vec::new();
        for entry in self.types.iter() {
            if entry.value().module == module {
                entry.value().retire();
                retired.push(entry.value().clone());
            }
        }
        for descriptor in retired {
            self.by_name
                .remove_if(&descriptor.name, |_, id| *id == descriptor.id);
            self.by_native
                .remove_if(&descriptor.native, |_, id| *id == descriptor.id);
            if let Some(entry) = self.types.get(&descriptor.id) {
                entry.remove();
            }
            self.members.remove(&descriptor.id);
        }

        for mut entry in self.members.iter_mut() {
            entry.constructors.retain(|(owner, _)| *owner != module);
            entry.methods.retain(|(owner, _)| *owner != module);
            entry.properties.retain(|(owner, _)| *owner != module);
        }
        self.converters.remove_module(module);
        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    crate::reflect_type!(Point: eq);

    #[derive(Clone, Debug, PartialEq)]
    struct Named {
        name: String,
    }

    crate::reflect_type!(Named: eq);

    #[derive(Clone, Debug, PartialEq)]
    struct Label {
        base: Named,
        text: String,
    }

    crate::reflect_type!(Label: eq);

    #[test]
    fn primitives_are_preinstalled() {
        let registry = TypeRegistry::new();
        let ty = registry.get::<i32>();
        assert!(ty.is_valid());
        assert!(ty.is_primitive());
        assert!(ty.is_arithmetic());
        assert_eq!(registry.get_by_name("f64").id(), registry.get::<f64>().id());
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = TypeRegistry::new();
        let first = registry.register::<Point>("Point").unwrap();
        let second = registry.register::<Point>("Point").unwrap();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn duplicate_name_for_different_type_fails() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();
        let err = registry.register::<Named>("Point").unwrap_err();
        assert!(matches!(err, Error::DuplicateTypeName { .. }));
    }

    #[test]
    fn stable_ids_across_lookup_paths() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();

        let by_name = registry.get_by_name("Point");
        let by_native = registry.get::<Point>();
        let by_value = Variant::new(Point { x: 0, y: 0 }).get_type(&registry);
        assert_eq!(by_name.id(), by_native.id());
        assert_eq!(by_name.id(), by_value.id());
    }

    #[test]
    fn type_list_is_ordered_by_id() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();
        registry.register::<Named>("Named").unwrap();

        let list = registry.type_list();
        let ids: Vec<u32> = list.iter().map(|t| t.id().value()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert!(list.iter().any(|t| t.name() == "Named"));
    }

    #[test]
    fn base_registration_and_derivation() {
        let registry = TypeRegistry::new();
        registry.register::<Named>("Named").unwrap();
        registry.register::<Label>("Label").unwrap();
        registry
            .register_base::<Label, Named>(|l| &l.base, |l| &mut l.base)
            .unwrap();

        let label = registry.get::<Label>();
        let named = registry.get::<Named>();
        assert!(registry.is_derived_from(&label, &named));
        assert!(!registry.is_derived_from(&named, &label));
        assert!(registry.is_derived_from(&label, &label));
        assert_eq!(label.base_ids(), vec![named.id()]);
    }

    #[test]
    fn upcast_reaches_embedded_base() {
        let registry = TypeRegistry::new();
        registry.register::<Named>("Named").unwrap();
        registry.register::<Label>("Label").unwrap();
        registry
            .register_base::<Label, Named>(|l| &l.base, |l| &mut l.base)
            .unwrap();

        let label = Label {
            base: Named {
                name: "n".to_string(),
            },
            text: "t".to_string(),
        };
        let named: &Named = registry.upcast_to::<Named>(&label).unwrap();
        assert!(std::ptr::eq(named, &label.base));
    }

    #[test]
    fn base_member_reachable_from_derived_instance() {
        let registry = TypeRegistry::new();
        registry.register::<Named>("Named").unwrap();
        registry.register::<Label>("Label").unwrap();
        registry
            .register_base::<Label, Named>(|l| &l.base, |l| &mut l.base)
            .unwrap();
        registry
            .register_property::<Named>(PropertyDesc::from_field(
                "name",
                |n: &Named| &n.name,
                |n: &mut Named| &mut n.name,
            ))
            .unwrap();

        let label = Label {
            base: Named {
                name: "hello".to_string(),
            },
            text: String::new(),
        };
        let inst = Instance::of(&label);
        let value = registry.get_property_value(&inst, "name");
        assert_eq!(value.get_value::<String>(), Some("hello".to_string()));

        let label_ty = registry.get::<Label>();
        assert!(registry.get_property(&label_ty, "name").is_some());
        assert!(registry
            .properties(&label_ty, MemberFilter::DeclaredOnly)
            .is_empty());
    }

    #[test]
    fn wrapper_sees_through_to_pointee() {
        let registry = TypeRegistry::new();
        registry.register::<Named>("Named").unwrap();
        registry.register_shared::<Named>("Arc<Named>").unwrap();
        registry
            .register_method::<Named>(MethodDesc::new("name_len", |n: &Named| n.name.len() as u64))
            .unwrap();

        let wrapper_ty = registry.get::<Arc<Named>>();
        assert!(wrapper_ty.is_wrapper());
        assert_eq!(wrapper_ty.wrapped_id(), registry.get::<Named>().id());
        assert_eq!(wrapper_ty.raw_id(), registry.get::<Named>().id());

        let shared = Arc::new(Named {
            name: "abcd".to_string(),
        });
        let mut inst = Instance::of(&shared);
        let out = registry.invoke(&mut inst, "name_len", &[]);
        assert_eq!(out.get_value::<u64>(), Some(4));
    }

    #[test]
    fn exact_overload_resolution() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();
        registry
            .register_method::<Point>(MethodDesc::new("set", |_: &Point, _: f64| 1i32))
            .unwrap();
        registry
            .register_method::<Point>(MethodDesc::new("set", |_: &Point, _: i32| 2i32))
            .unwrap();

        let point = Point { x: 0, y: 0 };
        let mut inst = Instance::of(&point);
        let out = registry.invoke(&mut inst, "set", &[Variant::new(1.5f64)]);
        assert_eq!(out.get_value::<i32>(), Some(1));
        let out = registry.invoke(&mut inst, "set", &[Variant::new(1i32)]);
        assert_eq!(out.get_value::<i32>(), Some(2));
        // f32 matches neither overload; no conversion ranking happens.
        let out = registry.invoke(&mut inst, "set", &[Variant::new(1.5f32)]);
        assert!(!out.is_valid());

        let ty = registry.get::<Point>();
        let sig = [std::any::TypeId::of::<f64>()];
        let found = registry.get_method_with_signature(&ty, "set", &sig).unwrap();
        assert!(found.matches_signature(&sig));
    }

    #[test]
    fn duplicate_member_registration_keeps_the_first() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();
        registry
            .register_method::<Point>(MethodDesc::new("answer", |_: &Point| 1i32))
            .unwrap();
        registry
            .register_method::<Point>(MethodDesc::new("answer", |_: &Point| 101i32))
            .unwrap();
        registry
            .register_property::<Point>(PropertyDesc::from_field(
                "x",
                |p: &Point| &p.x,
                |p: &mut Point| &mut p.x,
            ))
            .unwrap();
        registry
            .register_property::<Point>(PropertyDesc::getter_only("x", |p: &Point| p.y))
            .unwrap();

        let ty = registry.get::<Point>();
        assert_eq!(registry.methods(&ty, MemberFilter::DeclaredOnly).len(), 1);
        assert_eq!(registry.properties(&ty, MemberFilter::DeclaredOnly).len(), 1);

        let point = Point { x: 5, y: 9 };
        let mut inst = Instance::of(&point);
        let out = registry.invoke(&mut inst, "answer", &[]);
        assert_eq!(out.get_value::<i32>(), Some(1));
        // The property still reads the field, not the later getter.
        assert_eq!(
            registry
                .get_property_value(&Instance::of(&point), "x")
                .get_value::<i32>(),
            Some(5)
        );
    }

    #[test]
    fn create_tries_constructors_in_order() {
        let registry = TypeRegistry::new();
        registry.register::<Point>("Point").unwrap();
        registry
            .register_constructor::<Point>(ConstructorDesc::new(|| Point { x: 0, y: 0 }))
            .unwrap();
        registry
            .register_constructor::<Point>(ConstructorDesc::new(|x: i32, y: i32| Point { x, y }))
            .unwrap();

        let p = registry.create_by_name("Point", &[Variant::new(3i32), Variant::new(4i32)]);
        assert_eq!(p.get_value::<Point>(), Some(Point { x: 3, y: 4 }));
        let p = registry.create_by_name("Point", &[]);
        assert_eq!(p.get_value::<Point>(), Some(Point { x: 0, y: 0 }));
        assert!(!registry
            .create_by_name("Point", &[Variant::new(3i64)])
            .is_valid());
    }

    #[test]
    fn global_members() {
        let registry = TypeRegistry::new();
        registry.register_global_method(MethodDesc::new("double", |v: i32| v * 2));

        let out = registry.invoke_global("double", &[Variant::new(21i32)]);
        assert_eq!(out.get_value::<i32>(), Some(42));
        assert!(registry.get_global_method("double").is_some());
        assert!(!registry.invoke_global("missing", &[]).is_valid());
    }

    #[test]
    fn module_unload_removes_and_invalidates() {
        let registry = TypeRegistry::new();
        registry.register::<Named>("Named").unwrap();

        let module = ModuleId::new(1);
        registry
            .notify_module_loaded(module, |r| {
                r.register::<Point>("PluginPoint")?;
                r.register_method::<Named>(MethodDesc::new("from_plugin", |_: &Named| 1i32))?;
                Ok(())
            })
            .unwrap();

        let plugin_ty = registry.get_by_name("PluginPoint");
        assert!(plugin_ty.is_valid());
        assert_eq!(plugin_ty.module(), module);

        registry.notify_module_unloaded(module).unwrap();

        // The old handle flips invalid; lookups no longer find the type.
        assert!(!plugin_ty.is_valid());
        assert!(!registry.get_by_name("PluginPoint").is_valid());
        assert!(!registry.get::<Point>().is_valid());

        // The method the plugin attached to a host type is gone too.
        let named_ty = registry.get::<Named>();
        assert!(registry.get_method(&named_ty, "from_plugin").is_none());

        assert!(matches!(
            registry.notify_module_unloaded(module),
            Err(Error::ModuleNotLoaded { .. })
        ));
    }

    #[test]
    fn duplicate_module_load_fails() {
        let registry = TypeRegistry::new();
        let module = ModuleId::new(2);
        registry.notify_module_loaded(module, |_| Ok(())).unwrap();
        assert!(matches!(
            registry.notify_module_loaded(module, |_| Ok(())),
            Err(Error::ModuleAlreadyLoaded { .. })
        ));
        assert!(registry.is_module_loaded(module));
    }
}
