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

//! Built-in conversion rules between the primitive types.
//!
//! These rules are always consulted before user-registered converters:
//!
//! - numeric → `bool` is `!= 0`; string → `bool` trims ASCII whitespace and
//!   maps case-insensitive `"false"`, `"0"` and the empty string to
//!   `false`, everything else to `true`
//! - numeric narrowing fails when the source value lies outside the
//!   destination's representable range; the boundary values themselves are
//!   inclusive (`127` → `i8` succeeds, `128` fails)
//! - string → numeric must consume the entire trimmed text; trailing
//!   garbage is a failure, never a truncated success
//! - `f32` → string formats with 7 significant digits, `f64` with full
//!   precision

use std::any::TypeId;

use crate::variant::{Inline, Storage, Variant};

/// A numeric value promoted to its widest representation.
///
/// Used for cross-type comparison and narrowing checks. Signed and unsigned
/// integers are kept apart so that `-1i64` never compares equal to
/// `u64::MAX`.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Num {
    /// Any signed integer, widened to `i64`.
    Int(i64),
    /// Any unsigned integer, widened to `u64`.
    UInt(u64),
    /// `f32` or `f64`, widened to `f64`.
    Float(f64),
}

impl Num {
    /// Widen to `i128` for exact range checks; truncates floats.
    ///
    /// Non-finite floats have no integral value and return `None`.
    pub(crate) fn to_i128(self) -> Option<i128> {
        match self {
            Num::Int(v) => Some(i128::from(v)),
            Num::UInt(v) => Some(i128::from(v)),
            Num::Float(v) => {
                if v.is_finite() {
                    Some(v.trunc() as i128)
                } else {
                    None
                }
            }
        }
    }

    /// Widen to `f64`; always succeeds.
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::UInt(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    /// `true` when the value is non-zero (NaN counts as non-zero).
    pub(crate) fn is_nonzero(self) -> bool {
        match self {
            Num::Int(v) => v != 0,
            Num::UInt(v) => v != 0,
            Num::Float(v) => v != 0.0,
        }
    }
}

/// Extract the numeric value of a variant holding an arithmetic primitive.
///
/// `bool`, `char` and strings are not numbers here; their conversions are
/// separate rules.
pub(crate) fn num_of(variant: &Variant) -> Option<Num> {
    match &variant.storage {
        Storage::Inline(inline) => match inline {
            Inline::I8(v) => Some(Num::Int(i64::from(*v))),
            Inline::I16(v) => Some(Num::Int(i64::from(*v))),
            Inline::I32(v) => Some(Num::Int(i64::from(*v))),
            Inline::I64(v) => Some(Num::Int(*v)),
            Inline::U8(v) => Some(Num::UInt(u64::from(*v))),
            Inline::U16(v) => Some(Num::UInt(u64::from(*v))),
            Inline::U32(v) => Some(Num::UInt(u64::from(*v))),
            Inline::U64(v) => Some(Num::UInt(*v)),
            Inline::F32(v) => Some(Num::Float(f64::from(*v))),
            Inline::F64(v) => Some(Num::Float(*v)),
            Inline::Bool(_) | Inline::Char(_) => None,
        },
        _ => None,
    }
}

/// Compare two promoted numbers.
///
/// Integer/integer comparisons are exact; anything involving a float is
/// compared as `f64` and returns `None` for NaN.
pub(crate) fn cmp_num(a: Num, b: Num) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (Num::UInt(x), Num::UInt(y)) => Some(x.cmp(&y)),
        (Num::Int(x), Num::UInt(y)) => Some(i128::from(x).cmp(&i128::from(y))),
        (Num::UInt(x), Num::Int(y)) => Some(i128::from(x).cmp(&i128::from(y))),
        _ => a.to_f64().partial_cmp(&b.to_f64()),
    }
}

fn trimmed(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Render a float with a fixed number of significant digits, trimming
/// trailing zeros.
fn format_sig(value: f64, sig: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (sig - 1 - magnitude).max(0) as usize;
    let rendered = format!("{value:.decimals$}");
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}

/// Format an `f32` with 7 significant digits.
pub(crate) fn format_f32(value: f32) -> String {
    format_sig(f64::from(value), 7)
}

/// Format an `f64` with full precision (shortest round-trip form).
pub(crate) fn format_f64(value: f64) -> String {
    format!("{value}")
}

/// A primitive type that can be produced by the built-in conversion rules.
pub(crate) trait BuiltinTarget: Sized {
    /// Apply the built-in rules to produce `Self` from the held value.
    fn from_variant(variant: &Variant) -> Option<Self>;
}

fn narrow<T: TryFrom<i128>>(num: Num) -> Option<T> {
    T::try_from(num.to_i128()?).ok()
}

macro_rules! builtin_int_target {
    ($($t:ty),* $(,)?) => {
        $(
            impl BuiltinTarget for $t {
                fn from_variant(variant: &Variant) -> Option<Self> {
                    if let Some(v) = variant.get_ref::<$t>() {
                        return Some(*v);
                    }
                    if let Some(b) = variant.get_ref::<bool>() {
                        return Some(if *b { 1 } else { 0 });
                    }
                    if let Some(s) = variant.get_ref::<String>() {
                        return trimmed(s).parse::<$t>().ok();
                    }
                    narrow::<$t>(num_of(variant)?)
                }
            }
        )*
    };
}

builtin_int_target!(i8, i16, i32, i64, u8, u16, u32, u64);

impl BuiltinTarget for bool {
    fn from_variant(variant: &Variant) -> Option<Self> {
        if let Some(v) = variant.get_ref::<bool>() {
            return Some(*v);
        }
        if let Some(s) = variant.get_ref::<String>() {
            let s = trimmed(s);
            return Some(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")));
        }
        num_of(variant).map(Num::is_nonzero)
    }
}

impl BuiltinTarget for f64 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        if let Some(v) = variant.get_ref::<f64>() {
            return Some(*v);
        }
        if let Some(b) = variant.get_ref::<bool>() {
            return Some(if *b { 1.0 } else { 0.0 });
        }
        if let Some(s) = variant.get_ref::<String>() {
            return trimmed(s).parse::<f64>().ok();
        }
        num_of(variant).map(Num::to_f64)
    }
}

impl BuiltinTarget for f32 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        if let Some(v) = variant.get_ref::<f32>() {
            return Some(*v);
        }
        let wide = f64::from_variant(variant)?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(wide as f32)
    }
}

impl BuiltinTarget for char {
    fn from_variant(variant: &Variant) -> Option<Self> {
        if let Some(v) = variant.get_ref::<char>() {
            return Some(*v);
        }
        let s = variant.get_ref::<String>()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl BuiltinTarget for String {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match &variant.storage {
            Storage::Inline(inline) => Some(match inline {
                Inline::Bool(v) => v.to_string(),
                Inline::Char(v) => v.to_string(),
                Inline::I8(v) => v.to_string(),
                Inline::I16(v) => v.to_string(),
                Inline::I32(v) => v.to_string(),
                Inline::I64(v) => v.to_string(),
                Inline::U8(v) => v.to_string(),
                Inline::U16(v) => v.to_string(),
                Inline::U32(v) => v.to_string(),
                Inline::U64(v) => v.to_string(),
                Inline::F32(v) => format_f32(*v),
                Inline::F64(v) => format_f64(*v),
            }),
            _ => variant.get_ref::<String>().cloned(),
        }
    }
}

/// Apply the built-in rules with a statically known target type.
pub(crate) fn convert_to<T: BuiltinTarget>(variant: &Variant) -> Option<T> {
    if !variant.is_valid() {
        return None;
    }
    T::from_variant(variant)
}

/// Apply the built-in rules with a runtime target type.
///
/// Returns a new variant holding the converted value, or `None` when no
/// built-in rule applies or the conversion fails.
pub(crate) fn convert_native(variant: &Variant, target: TypeId) -> Option<Variant> {
    macro_rules! try_target {
        ($($t:ty),* $(,)?) => {
            $(
                if target == TypeId::of::<$t>() {
                    return convert_to::<$t>(variant).map(Variant::new);
                }
            )*
        };
    }
    try_target!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_boundaries_are_inclusive() {
        assert_eq!(convert_to::<i8>(&Variant::new(127i32)), Some(127));
        assert_eq!(convert_to::<i8>(&Variant::new(128i32)), None);
        assert_eq!(convert_to::<i8>(&Variant::new(-128i64)), Some(-128));
        assert_eq!(convert_to::<i8>(&Variant::new(-129i64)), None);
        assert_eq!(convert_to::<u8>(&Variant::new(255u64)), Some(255));
        assert_eq!(convert_to::<u8>(&Variant::new(256u64)), None);
        assert_eq!(convert_to::<u64>(&Variant::new(-1i32)), None);
    }

    #[test]
    fn string_parsing_must_consume_everything() {
        assert_eq!(convert_to::<i32>(&Variant::from("23")), Some(23));
        assert_eq!(convert_to::<i32>(&Variant::from(" 23 ")), Some(23));
        assert_eq!(convert_to::<i32>(&Variant::from("23abc")), None);
        assert_eq!(convert_to::<f64>(&Variant::from("2.5")), Some(2.5));
        assert_eq!(convert_to::<f64>(&Variant::from("2.5x")), None);
    }

    #[test]
    fn string_to_bool_policy() {
        assert_eq!(convert_to::<bool>(&Variant::from("false")), Some(false));
        assert_eq!(convert_to::<bool>(&Variant::from(" FaLsE ")), Some(false));
        assert_eq!(convert_to::<bool>(&Variant::from("0")), Some(false));
        assert_eq!(convert_to::<bool>(&Variant::from("")), Some(false));
        assert_eq!(convert_to::<bool>(&Variant::from("yes")), Some(true));
        assert_eq!(convert_to::<bool>(&Variant::from("1")), Some(true));
    }

    #[test]
    fn numeric_to_bool_is_nonzero() {
        assert_eq!(convert_to::<bool>(&Variant::new(0i32)), Some(false));
        assert_eq!(convert_to::<bool>(&Variant::new(-3i64)), Some(true));
        assert_eq!(convert_to::<bool>(&Variant::new(0.0f64)), Some(false));
    }

    #[test]
    fn float_truncates_to_int_with_range_check() {
        assert_eq!(convert_to::<i32>(&Variant::new(3.7f64)), Some(3));
        assert_eq!(convert_to::<i8>(&Variant::new(300.0f64)), None);
        assert_eq!(convert_to::<i32>(&Variant::new(f64::NAN)), None);
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_f32(2.3f32), "2.3");
        assert_eq!(format_f32(0.0f32), "0");
        assert_eq!(format_f64(0.5f64), "0.5");
        assert_eq!(convert_to::<String>(&Variant::new(42i32)), Some("42".into()));
        assert_eq!(convert_to::<String>(&Variant::new(true)), Some("true".into()));
    }

    #[test]
    fn signedness_respected_in_comparison() {
        let less = cmp_num(Num::Int(-1), Num::UInt(u64::MAX)).unwrap();
        assert_eq!(less, std::cmp::Ordering::Less);
    }

    #[test]
    fn f32_narrowing_range_check() {
        assert_eq!(convert_to::<f32>(&Variant::new(1.5f64)), Some(1.5f32));
        assert_eq!(convert_to::<f32>(&Variant::new(1e300f64)), None);
    }
}
