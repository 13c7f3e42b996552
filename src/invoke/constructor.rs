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

//! Constructor descriptors.

use dashmap::DashMap;

use crate::{
    invoke::{
        method::{match_arguments, Invoker, MethodFn, NoRecv},
        parameter::{AccessLevel, ParameterInfo},
        policy::ReturnPolicy,
        Instance,
    },
    types::{TypeId, TypeRegistry},
    variant::Variant,
};

/// A registered way to produce instances of a type.
///
/// Backed by any receiver-less callable returning the constructed value —
/// a real constructor closure and a factory function are indistinguishable
/// to callers. Deposited with [`TypeRegistry::register_constructor`];
/// argument matching follows the same rules as methods, including trailing
/// defaults and the exact-type requirement.
///
/// # Examples
///
/// ```rust
/// use reflekt::{reflect_type, ConstructorDesc, TypeRegistry, Variant};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// reflect_type!(Point: eq);
///
/// let registry = TypeRegistry::new();
/// let ctor = ConstructorDesc::new(|x: i32, y: i32| Point { x, y });
///
/// let p = ctor.invoke(&registry, &[Variant::new(1i32), Variant::new(2i32)]);
/// assert_eq!(p.get_value::<Point>(), Some(Point { x: 1, y: 2 }));
/// ```
pub struct ConstructorDesc {
    pub(crate) declaring: TypeId,
    pub(crate) params: Vec<ParameterInfo>,
    pub(crate) defaults: Vec<Variant>,
    pub(crate) policy: ReturnPolicy,
    pub(crate) access: AccessLevel,
    pub(crate) produces_native: std::any::TypeId,
    pub(crate) produces_type_name: &'static str,
    pub(crate) metadata: DashMap<String, Variant>,
    invoker: Invoker,
}

impl ConstructorDesc {
    /// Build a constructor registration from a receiver-less callable.
    pub fn new<Args, R, F>(factory: F) -> Self
    where
        F: MethodFn<(NoRecv, Args, R)>,
    {
        let (produces_native, produces_type_name) = F::return_info();
        ConstructorDesc {
            declaring: TypeId::INVALID,
            params: F::parameter_infos(),
            defaults: Vec::new(),
            policy: ReturnPolicy::default(),
            access: AccessLevel::default(),
            produces_native,
            produces_type_name,
            metadata: DashMap::new(),
            invoker: factory.erase(),
        }
    }

    /// Set the return packaging policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReturnPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the declared access level.
    #[must_use]
    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    /// Register default values for the trailing parameters.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Vec<Variant>) -> Self {
        let keep = defaults.len().min(self.params.len());
        let skip = defaults.len() - keep;
        self.defaults = defaults.into_iter().skip(skip).collect();
        let first_default = self.params.len() - self.defaults.len();
        for param in &mut self.params[first_default..] {
            param.has_default = true;
        }
        self
    }

    /// Attach names to the parameters, in declaration order.
    #[must_use]
    pub fn with_param_names(mut self, names: &[&str]) -> Self {
        for (param, name) in self.params.iter_mut().zip(names) {
            param.name = Some((*name).to_string());
        }
        self
    }

    /// Attach a metadata value under `key`.
    #[must_use]
    pub fn with_metadata(self, key: &str, value: Variant) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Numeric id of the constructed type; set at deposit.
    #[must_use]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring
    }

    /// Declared parameter metadata.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.params
    }

    /// Number of parameters that must be supplied.
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.params.len() - self.defaults.len()
    }

    /// The return packaging policy.
    #[must_use]
    pub fn policy(&self) -> ReturnPolicy {
        self.policy
    }

    /// The declared access level.
    #[must_use]
    pub fn access(&self) -> AccessLevel {
        self.access
    }

    /// Look up a metadata value by key.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Variant> {
        self.metadata.get(key).map(|v| v.clone())
    }

    /// Exact signature check against a list of native type ids.
    #[must_use]
    pub fn matches_signature(&self, signature: &[std::any::TypeId]) -> bool {
        self.params.len() == signature.len()
            && self.params.iter().zip(signature).all(|(p, s)| p.ty == *s)
    }

    pub(crate) fn signature_natives(&self) -> Vec<std::any::TypeId> {
        self.params.iter().map(|p| p.ty).collect()
    }

    pub(crate) fn accepts(&self, args: &[Variant]) -> bool {
        match_arguments(&self.params, &self.defaults, args).is_some()
    }

    /// Construct an instance; empty variant on any argument mismatch.
    pub fn invoke(&self, registry: &TypeRegistry, args: &[Variant]) -> Variant {
        match match_arguments(&self.params, &self.defaults, args) {
            Some(full) => {
                let mut unit = Instance::Unit;
                (self.invoker)(registry, &mut unit, &full, self.policy)
            }
            None => Variant::empty(),
        }
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

    #[test]
    fn factory_and_closure_are_indistinguishable() {
        fn make_origin() -> Point {
            Point { x: 0, y: 0 }
        }

        let registry = TypeRegistry::new();
        let from_fn = ConstructorDesc::new(make_origin);
        let from_closure = ConstructorDesc::new(|| Point { x: 0, y: 0 });

        let a = from_fn.invoke(&registry, &[]);
        let b = from_closure.invoke(&registry, &[]);
        assert_eq!(a.get_value::<Point>(), b.get_value::<Point>());
    }

    #[test]
    fn defaults_shrink_required_arity() {
        let registry = TypeRegistry::new();
        let ctor = ConstructorDesc::new(|x: i32, y: i32| Point { x, y })
            .with_defaults(vec![Variant::new(0i32)])
            .with_param_names(&["x", "y"]);

        assert_eq!(ctor.required_count(), 1);
        assert_eq!(ctor.parameters()[1].name(), Some("y"));

        let p = ctor.invoke(&registry, &[Variant::new(4i32)]);
        assert_eq!(p.get_value::<Point>(), Some(Point { x: 4, y: 0 }));
        assert!(!ctor.invoke(&registry, &[]).is_valid());
    }

    #[test]
    fn shared_policy_constructs_into_arc() {
        use std::sync::Arc;

        let registry = TypeRegistry::new();
        let ctor = ConstructorDesc::new(|| Point { x: 1, y: 1 })
            .with_policy(ReturnPolicy::Shared);

        let p = ctor.invoke(&registry, &[]);
        assert!(p.is_type::<Arc<Point>>());
    }
}
