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

//! Non-owning call argument wrapper.

use crate::{value::ReflectValue, variant::Variant};

/// A borrowed view of one call argument.
///
/// Cheap to construct on the stack around a [`Variant`]; used by property
/// setters and anywhere a callee inspects an argument without taking
/// ownership.
#[derive(Clone, Copy)]
pub struct Argument<'a> {
    variant: &'a Variant,
}

impl<'a> Argument<'a> {
    /// Wrap a variant.
    #[must_use]
    pub fn new(variant: &'a Variant) -> Self {
        Argument { variant }
    }

    /// The wrapped variant.
    #[must_use]
    pub fn variant(&self) -> &'a Variant {
        self.variant
    }

    /// `true` when the argument holds a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.variant.is_valid()
    }

    /// The [`std::any::TypeId`] of the held value, if any.
    #[must_use]
    pub fn native_id(&self) -> Option<std::any::TypeId> {
        self.variant.native_id()
    }

    /// Check whether the argument holds exactly `T`.
    ///
    /// `T == Variant` reports `true` for any valid argument.
    #[must_use]
    pub fn is_type<T: ReflectValue>(&self) -> bool {
        if std::any::TypeId::of::<T>() == std::any::TypeId::of::<Variant>() {
            return self.variant.is_valid();
        }
        self.variant.is_type::<T>()
    }

    /// Extract a copy of the held value as `T` (`T == Variant` clones the
    /// whole variant).
    #[must_use]
    pub fn get_value<T: ReflectValue + Clone>(&self) -> Option<T> {
        self.variant.get_value::<T>()
    }
}

impl<'a> From<&'a Variant> for Argument<'a> {
    fn from(variant: &'a Variant) -> Self {
        Argument::new(variant)
    }
}
