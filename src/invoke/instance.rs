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

//! Non-owning receiver references.

use std::any::Any;

use crate::{
    types::{Type, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

/// A stack-only, non-owning reference to the receiver of a call.
///
/// An instance is built around a borrowed value or variant and handed to
/// method and property dispatch. A shared instance fails any mutating
/// dispatch; the unit instance is the receiver of static (associated) and
/// global calls.
///
/// When a member is declared on a base type and the instance holds a
/// derived value, dispatch resolves through the upcast projections
/// registered with [`TypeRegistry::register_base`].
pub enum Instance<'a> {
    /// No receiver; used for static and global dispatch.
    Unit,
    /// Read-only receiver.
    Shared(&'a dyn Any),
    /// Mutable receiver.
    Exclusive(&'a mut dyn Any),
}

impl<'a> Instance<'a> {
    /// Borrow a value as a read-only receiver.
    #[must_use]
    pub fn of<T: ReflectValue>(value: &'a T) -> Self {
        Instance::Shared(value)
    }

    /// Borrow a value as a mutable receiver.
    #[must_use]
    pub fn of_mut<T: ReflectValue>(value: &'a mut T) -> Self {
        Instance::Exclusive(value)
    }

    /// Borrow the value held in a variant as a read-only receiver.
    ///
    /// An empty variant yields the unit instance, so dispatch on it fails
    /// the same way any wrong receiver does.
    #[must_use]
    pub fn from_variant(variant: &'a Variant) -> Self {
        match variant.as_any() {
            Some(any) => Instance::Shared(any),
            None => Instance::Unit,
        }
    }

    /// Borrow the value held in a variant as a mutable receiver.
    #[must_use]
    pub fn from_variant_mut(variant: &'a mut Variant) -> Self {
        match variant.as_any_mut() {
            Some(any) => Instance::Exclusive(any),
            None => Instance::Unit,
        }
    }

    /// `true` when no receiver is attached.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Instance::Unit)
    }

    /// `true` when the receiver may be mutated through this instance.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        matches!(self, Instance::Exclusive(_))
    }

    /// Resolve the registered type of the held receiver.
    #[must_use]
    pub fn get_type(&self, registry: &TypeRegistry) -> Type {
        match self.shared_any() {
            Some(any) => registry.get_by_native(any.type_id()),
            None => Type::invalid(),
        }
    }

    /// Read access to the receiver; available for both borrow modes.
    pub(crate) fn shared_any(&self) -> Option<&dyn Any> {
        match self {
            Instance::Unit => None,
            Instance::Shared(any) => Some(*any),
            Instance::Exclusive(any) => Some(&**any),
        }
    }

    /// Write access to the receiver; `None` for shared and unit instances.
    pub(crate) fn exclusive_any(&mut self) -> Option<&mut dyn Any> {
        match self {
            Instance::Exclusive(any) => Some(&mut **any),
            _ => None,
        }
    }
}

impl Default for Instance<'_> {
    fn default() -> Self {
        Instance::Unit
    }
}
