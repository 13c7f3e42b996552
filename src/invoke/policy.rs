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

//! Return value policies.

use strum::Display;

use crate::{value::ReflectValue, variant::Variant};

/// How an invocation's return value is packaged into a [`Variant`].
///
/// Exactly one policy applies per registration; [`ReturnPolicy::Value`] is
/// the default everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ReturnPolicy {
    /// Move the returned value into the variant as-is.
    #[default]
    Value,
    /// Wrap the returned value in an owned `Box` before storing it. The
    /// caller extracts it as `Box<R>` and owns the allocation outright.
    Boxed,
    /// Wrap the returned value in an `Arc` before storing it. Copies of the
    /// result share the same allocation.
    Shared,
    /// Drop the returned value and yield the unit variant.
    Discard,
}

/// Package `value` per `policy`.
pub(crate) fn apply_policy<R>(value: R, policy: ReturnPolicy) -> Variant
where
    R: ReflectValue + Clone,
{
    match policy {
        ReturnPolicy::Value => Variant::new(value),
        ReturnPolicy::Boxed => Variant::new(Box::new(value)),
        ReturnPolicy::Shared => Variant::new(std::sync::Arc::new(value)),
        ReturnPolicy::Discard => Variant::unit(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn value_policy_stores_directly() {
        let v = apply_policy(5i32, ReturnPolicy::Value);
        assert_eq!(v.get_value::<i32>(), Some(5));
    }

    #[test]
    fn boxed_policy_wraps() {
        let v = apply_policy("x".to_string(), ReturnPolicy::Boxed);
        assert!(v.is_type::<Box<String>>());
        assert_eq!(
            v.get_value::<Box<String>>().map(|b| *b),
            Some("x".to_string())
        );
    }

    #[test]
    fn shared_policy_shares() {
        let v = apply_policy(7i64, ReturnPolicy::Shared);
        let a = v.get_value::<Arc<i64>>().unwrap();
        let b = v.get_value::<Arc<i64>>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn discard_policy_yields_unit() {
        let v = apply_policy(5i32, ReturnPolicy::Discard);
        assert!(v.is_unit());
    }
}
