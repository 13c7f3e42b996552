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

//! Weak-total comparison between variants.
//!
//! Equality and ordering on [`Variant`] never panic and never error; when
//! two values are incomparable the answer is simply `false` (for `==`) or
//! `None` (for ordering). The chain, in order:
//!
//! 1. two empty variants are equal (and order as equal)
//! 2. an empty variant and anything else are unequal and unordered
//! 3. same held type: the type's own equality/ordering hook, when the type
//!    opted in (`reflect_type!(T: eq)` / `(T: eq, ord)`)
//! 4. two arithmetic values: numeric comparison with sign awareness, so
//!    `-1i64` never equals `u64::MAX`; anything involving a float compares
//!    as `f64` and NaN stays unordered
//! 5. a string and an arithmetic value: the string is parsed as the
//!    number's type first, then rule 4 applies
//!
//! The registry-aware [`Variant::compare_with`](super::Variant) additionally
//! consults user converters; the operators here are registry-free.

use std::cmp::Ordering;

use crate::{
    convert::builtin::{self, Num},
    variant::Variant,
};

/// The numeric value of a variant, parsing strings as `f64` only when the
/// counterpart side fixes a numeric context.
fn num_for_mixed(variant: &Variant, other: &Variant) -> Option<Num> {
    if let Some(num) = builtin::num_of(variant) {
        return Some(num);
    }
    // String side of a string/number pair: parse in the number's domain.
    if variant.is_type::<String>() && builtin::num_of(other).is_some() {
        let native = other.native_id()?;
        return builtin::num_of(&builtin::convert_native(variant, native)?);
    }
    None
}

pub(crate) fn eq_variants(a: &Variant, b: &Variant) -> bool {
    match (a.is_valid(), b.is_valid()) {
        (false, false) => return true,
        (true, true) => {}
        _ => return false,
    }
    if a.native_id() == b.native_id() {
        let (Some(lhs), Some(rhs)) = (a.as_reflect(), b.as_reflect()) else {
            return false;
        };
        return lhs.partial_eq(rhs).unwrap_or(false);
    }
    match (num_for_mixed(a, b), num_for_mixed(b, a)) {
        (Some(x), Some(y)) => builtin::cmp_num(x, y) == Some(Ordering::Equal),
        _ => false,
    }
}

pub(crate) fn cmp_variants(a: &Variant, b: &Variant) -> Option<Ordering> {
    match (a.is_valid(), b.is_valid()) {
        (false, false) => return Some(Ordering::Equal),
        (true, true) => {}
        _ => return None,
    }
    if a.native_id() == b.native_id() {
        let (lhs, rhs) = (a.as_reflect()?, b.as_reflect()?);
        // Equality can hold even when the type has no ordering hook.
        if let Some(ordering) = lhs.partial_cmp_value(rhs) {
            return Some(ordering);
        }
        return match lhs.partial_eq(rhs) {
            Some(true) => Some(Ordering::Equal),
            _ => None,
        };
    }
    let (x, y) = (num_for_mixed(a, b)?, num_for_mixed(b, a)?);
    builtin::cmp_num(x, y)
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        eq_variants(self, other)
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        cmp_variants(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_variants_are_equal() {
        assert_eq!(Variant::empty(), Variant::empty());
        assert_ne!(Variant::empty(), Variant::new(0i32));
        assert_eq!(
            Variant::empty().partial_cmp(&Variant::empty()),
            Some(Ordering::Equal)
        );
        assert_eq!(Variant::empty().partial_cmp(&Variant::new(0i32)), None);
    }

    #[test]
    fn same_type_uses_value_equality() {
        assert_eq!(Variant::new(5i32), Variant::new(5i32));
        assert_ne!(Variant::new(5i32), Variant::new(6i32));
        assert_eq!(Variant::from("a"), Variant::from("a"));
        assert!(Variant::from("a") < Variant::from("b"));
    }

    #[test]
    fn cross_width_numeric_equality() {
        assert_eq!(Variant::new(5i32), Variant::new(5i64));
        assert_eq!(Variant::new(5u8), Variant::new(5i64));
        assert_eq!(Variant::new(2.0f64), Variant::new(2i32));
        assert!(Variant::new(1i32) < Variant::new(2u64));
    }

    #[test]
    fn signedness_is_respected() {
        assert_ne!(Variant::new(-1i64), Variant::new(u64::MAX));
        assert!(Variant::new(-1i64) < Variant::new(0u64));
    }

    #[test]
    fn string_number_comparison_parses_the_string() {
        assert_eq!(Variant::from("23"), Variant::new(23i32));
        assert_ne!(Variant::from("23abc"), Variant::new(23i32));
        assert!(Variant::from("5") < Variant::new(7i32));
    }

    #[test]
    fn nan_is_unordered_but_unequal() {
        let nan = Variant::new(f64::NAN);
        assert_ne!(nan, Variant::new(f64::NAN));
        assert_eq!(nan.partial_cmp(&Variant::new(1.0f64)), None);
    }

    #[test]
    fn unrelated_types_are_unequal_not_errors() {
        assert_ne!(Variant::new(true), Variant::from("true"));
        assert_ne!(Variant::new(vec![1i32]), Variant::new(1i32));
        assert_eq!(
            Variant::new(vec![1i32]).partial_cmp(&Variant::new(1i32)),
            None
        );
    }

    #[test]
    fn opted_in_user_type_compares_by_value() {
        #[derive(Clone, Debug, PartialEq)]
        struct Tag(u8);
        crate::reflect_type!(Tag: eq);

        assert_eq!(Variant::new(Tag(1)), Variant::new(Tag(1)));
        assert_ne!(Variant::new(Tag(1)), Variant::new(Tag(2)));
        // No ordering hook was opted into.
        assert_eq!(
            Variant::new(Tag(1)).partial_cmp(&Variant::new(Tag(2))),
            None
        );
        assert_eq!(
            Variant::new(Tag(1)).partial_cmp(&Variant::new(Tag(1))),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn type_without_hooks_is_never_equal() {
        #[derive(Clone, Debug)]
        struct Opaque;
        crate::reflect_type!(Opaque);

        assert_ne!(Variant::new(Opaque), Variant::new(Opaque));
    }
}
