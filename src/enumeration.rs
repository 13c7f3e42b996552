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

//! Enumeration descriptors: name ↔ underlying-value mapping.
//!
//! A registered enumeration records, per enumerator, its name, its
//! underlying integer value, and a prototype variant holding the enum value
//! itself. The descriptor feeds the built-in enum conversions: enum ↔
//! underlying integer always succeeds when representable, enum → string
//! yields the enumerator name and falls back to the numeric string for
//! unregistered values.

use std::{any::Any, sync::Arc};

use crate::{types::TypeId, variant::Variant};

/// One registered enumerator.
pub struct EnumEntry {
    /// The enumerator name (`"Red"`).
    pub name: String,
    /// The underlying integer value.
    pub value: i64,
    /// Prototype variant holding the enum value itself.
    pub(crate) prototype: Variant,
}

/// Descriptor of a registered enumeration type.
///
/// Obtained from [`crate::TypeRegistry::enumeration`]. Entry order follows
/// registration order.
pub struct EnumDesc {
    /// Numeric id of the enum type this descriptor belongs to.
    pub(crate) owner: TypeId,
    pub(crate) entries: boxcar::Vec<EnumEntry>,
    /// Extracts the underlying value from an erased enum value, normalized
    /// to `i64`.
    pub(crate) to_underlying: Arc<dyn Fn(&dyn Any) -> Option<i64> + Send + Sync>,
}

impl EnumDesc {
    /// Numeric id of the enumeration type itself.
    #[must_use]
    pub fn owner_id(&self) -> TypeId {
        self.owner
    }

    /// Number of registered enumerators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// `true` when no enumerator is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Enumerator names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, e)| e.name.as_str()).collect()
    }

    /// The name registered for an underlying value, if any.
    #[must_use]
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.value == value)
            .map(|(_, e)| e.name.as_str())
    }

    /// The underlying value registered for a name, if any.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(_, e)| e.value)
    }

    /// A variant holding the enum value registered for a name.
    #[must_use]
    pub fn variant_of(&self, name: &str) -> Variant {
        self.entries
            .iter()
            .find(|(_, e)| e.name == name)
            .map_or_else(Variant::empty, |(_, e)| e.prototype.clone())
    }

    /// A variant holding the enum value with the given underlying value.
    #[must_use]
    pub fn from_underlying(&self, value: i64) -> Variant {
        self.entries
            .iter()
            .find(|(_, e)| e.value == value)
            .map_or_else(Variant::empty, |(_, e)| e.prototype.clone())
    }

    /// Extract the underlying value from an erased enum value.
    pub(crate) fn underlying_of(&self, value: &dyn Any) -> Option<i64> {
        (self.to_underlying)(value)
    }

    /// Render an erased enum value as a string: the enumerator name when
    /// registered, otherwise the numeric string.
    pub(crate) fn render(&self, value: &dyn Any) -> Option<String> {
        let underlying = self.underlying_of(value)?;
        Some(match self.name_of(underlying) {
            Some(name) => name.to_string(),
            None => underlying.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Color {
        Red = 1,
        Green = 2,
    }

    crate::reflect_type!(Color: eq);

    fn desc() -> EnumDesc {
        let entries = boxcar::Vec::new();
        entries.push(EnumEntry {
            name: "Red".to_string(),
            value: Color::Red as i64,
            prototype: Variant::new(Color::Red),
        });
        entries.push(EnumEntry {
            name: "Green".to_string(),
            value: Color::Green as i64,
            prototype: Variant::new(Color::Green),
        });
        EnumDesc {
            owner: TypeId::INVALID,
            entries,
            to_underlying: Arc::new(|any| {
                any.downcast_ref::<Color>().map(|c| *c as i64)
            }),
        }
    }

    #[test]
    fn name_value_round_trip() {
        let desc = desc();
        assert_eq!(desc.value_of("Red"), Some(1));
        assert_eq!(desc.name_of(2), Some("Green"));
        assert_eq!(desc.value_of("Blue"), None);
        assert_eq!(desc.name_of(3), None);
    }

    #[test]
    fn variant_prototypes() {
        let desc = desc();
        let red = desc.variant_of("Red");
        assert_eq!(red.get_value::<Color>(), Some(Color::Red));
        assert!(!desc.variant_of("Blue").is_valid());
        let green = desc.from_underlying(2);
        assert_eq!(green.get_value::<Color>(), Some(Color::Green));
    }

    #[test]
    fn render_falls_back_to_number() {
        let desc = desc();
        assert_eq!(desc.render(&Color::Red), Some("Red".to_string()));
        assert_eq!(desc.underlying_of(&Color::Green), Some(2));
    }
}
