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

//! Parameter metadata and member access levels.

use strum::Display;

use crate::value::ReflectValue;

/// Declared visibility of a registered member.
///
/// Informational only — the runtime never enforces it, callers query it to
/// implement their own policy (e.g. a script binding hiding non-public
/// members).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum AccessLevel {
    /// Callable by anyone.
    #[default]
    Public,
    /// Intended for the declaring type and its derivatives.
    Protected,
    /// Intended for the declaring type only.
    Private,
}

/// Metadata of one declared parameter of a method or constructor.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub(crate) name: Option<String>,
    pub(crate) index: usize,
    pub(crate) ty: std::any::TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) has_default: bool,
}

impl ParameterInfo {
    pub(crate) fn new<T: ReflectValue>(index: usize) -> Self {
        ParameterInfo {
            name: None,
            index,
            ty: std::any::TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            has_default: false,
        }
    }

    /// The registered parameter name, if one was supplied.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Zero-based position in the declaration.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The [`std::any::TypeId`] of the declared parameter type.
    #[must_use]
    pub fn native(&self) -> std::any::TypeId {
        self.ty
    }

    /// The compile-time name of the declared parameter type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    /// `true` when a default value is registered for this parameter.
    ///
    /// Defaults are always a suffix of the parameter list.
    #[must_use]
    pub fn has_default_value(&self) -> bool {
        self.has_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_declared_type() {
        let p = ParameterInfo::new::<i32>(2);
        assert_eq!(p.index(), 2);
        assert_eq!(p.native(), std::any::TypeId::of::<i32>());
        assert_eq!(p.name(), None);
        assert!(!p.has_default_value());
    }

    #[test]
    fn access_level_displays() {
        assert_eq!(AccessLevel::Public.to_string(), "Public");
        assert_eq!(AccessLevel::default(), AccessLevel::Public);
    }
}
