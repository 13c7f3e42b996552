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

//! Method descriptors and the function-erasure machinery.
//!
//! [`MethodFn`] is the seam between plain Rust callables and the erased
//! invoker the runtime dispatches through. It is implemented for functions
//! and closures of up to six parameters in three receiver shapes, each
//! tagged by a marker in the trait's type parameter:
//!
//! - `Fn(&C, A...) -> R` — shared receiver ([`RecvRef`])
//! - `Fn(&mut C, A...) -> R` — mutable receiver ([`RecvMut`])
//! - `Fn(A...) -> R` — no receiver ([`NoRecv`]): static and global
//!   functions
//!
//! The marker lets inference pick the right impl; the occasional ambiguous
//! closure needs an explicit type on its first parameter.

use std::{marker::PhantomData, sync::Arc};

use dashmap::DashMap;

use crate::{
    invoke::{
        parameter::{AccessLevel, ParameterInfo},
        policy::{apply_policy, ReturnPolicy},
        Instance,
    },
    types::{TypeId, TypeRegistry},
    value::ReflectValue,
    variant::Variant,
};

/// Erased call: receiver, full argument list (defaults already applied),
/// and the packaging policy for the return value.
pub(crate) type Invoker = Arc<
    dyn Fn(&TypeRegistry, &mut Instance<'_>, &[Variant], ReturnPolicy) -> Variant + Send + Sync,
>;

/// Marker: the callable takes `&C` as receiver.
pub struct RecvRef<C>(PhantomData<C>);

/// Marker: the callable takes `&mut C` as receiver.
pub struct RecvMut<C>(PhantomData<C>);

/// Marker: the callable takes no receiver.
pub struct NoRecv;

/// A callable the runtime can erase into a method registration.
///
/// Implemented for `Fn` items of arity 0 through 6 per receiver shape; see
/// the [module documentation](self). Not meant to be implemented by hand.
pub trait MethodFn<Marker>: Send + Sync + 'static {
    /// Parameter metadata, receiver excluded.
    fn parameter_infos() -> Vec<ParameterInfo>;
    /// Native id and compile-time name of the return type.
    fn return_info() -> (std::any::TypeId, &'static str);
    /// `true` when the callable takes no receiver.
    fn is_static() -> bool;
    /// Erase into the runtime invoker.
    fn erase(self) -> Invoker;
}

fn resolve_shared<'r, C: 'static>(registry: &TypeRegistry, any: &'r dyn std::any::Any) -> Option<&'r C> {
    if let Some(receiver) = any.downcast_ref::<C>() {
        return Some(receiver);
    }
    registry.upcast_to::<C>(any)
}

fn resolve_exclusive<'r, C: 'static>(
    registry: &TypeRegistry,
    any: &'r mut dyn std::any::Any,
) -> Option<&'r mut C> {
    if any.downcast_ref::<C>().is_some() {
        return any.downcast_mut::<C>();
    }
    registry.upcast_mut_to::<C>(any)
}

macro_rules! impl_method_fn {
    ($($arg:ident),*) => {
        impl<F, C, R $(, $arg)*> MethodFn<(RecvRef<C>, ($($arg,)*), R)> for F
        where
            F: Fn(&C $(, $arg)*) -> R + Send + Sync + 'static,
            C: ReflectValue,
            R: ReflectValue + Clone,
            $($arg: ReflectValue + Clone,)*
        {
            fn parameter_infos() -> Vec<ParameterInfo> {
                let mut infos = Vec::new();
                $(infos.push(ParameterInfo::new::<$arg>(infos.len()));)*
                infos
            }
            fn return_info() -> (std::any::TypeId, &'static str) {
                (std::any::TypeId::of::<R>(), std::any::type_name::<R>())
            }
            fn is_static() -> bool {
                false
            }
            fn erase(self) -> Invoker {
                Arc::new(move |registry, instance, args, policy| {
                    let Some(any) = instance.shared_any() else {
                        return Variant::empty();
                    };
                    let Some(receiver) = resolve_shared::<C>(registry, any) else {
                        return Variant::empty();
                    };
                    let mut iter = args.iter();
                    $(
                        #[allow(non_snake_case)]
                        let $arg = match iter.next().and_then(Variant::get_value::<$arg>) {
                            Some(value) => value,
                            None => return Variant::empty(),
                        };
                    )*
                    if iter.next().is_some() {
                        return Variant::empty();
                    }
                    apply_policy((self)(receiver $(, $arg)*), policy)
                })
            }
        }

        impl<F, C, R $(, $arg)*> MethodFn<(RecvMut<C>, ($($arg,)*), R)> for F
        where
            F: Fn(&mut C $(, $arg)*) -> R + Send + Sync + 'static,
            C: ReflectValue,
            R: ReflectValue + Clone,
            $($arg: ReflectValue + Clone,)*
        {
            fn parameter_infos() -> Vec<ParameterInfo> {
                let mut infos = Vec::new();
                $(infos.push(ParameterInfo::new::<$arg>(infos.len()));)*
                infos
            }
            fn return_info() -> (std::any::TypeId, &'static str) {
                (std::any::TypeId::of::<R>(), std::any::type_name::<R>())
            }
            fn is_static() -> bool {
                false
            }
            fn erase(self) -> Invoker {
                Arc::new(move |registry, instance, args, policy| {
                    let Some(any) = instance.exclusive_any() else {
                        return Variant::empty();
                    };
                    let Some(receiver) = resolve_exclusive::<C>(registry, any) else {
                        return Variant::empty();
                    };
                    let mut iter = args.iter();
                    $(
                        #[allow(non_snake_case)]
                        let $arg = match iter.next().and_then(Variant::get_value::<$arg>) {
                            Some(value) => value,
                            None => return Variant::empty(),
                        };
                    )*
                    if iter.next().is_some() {
                        return Variant::empty();
                    }
                    apply_policy((self)(receiver $(, $arg)*), policy)
                })
            }
        }

        impl<F, R $(, $arg)*> MethodFn<(NoRecv, ($($arg,)*), R)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: ReflectValue + Clone,
            $($arg: ReflectValue + Clone,)*
        {
            fn parameter_infos() -> Vec<ParameterInfo> {
                let mut infos = Vec::new();
                $(infos.push(ParameterInfo::new::<$arg>(infos.len()));)*
                infos
            }
            fn return_info() -> (std::any::TypeId, &'static str) {
                (std::any::TypeId::of::<R>(), std::any::type_name::<R>())
            }
            fn is_static() -> bool {
                true
            }
            fn erase(self) -> Invoker {
                Arc::new(move |_registry, _instance, args, policy| {
                    let mut iter = args.iter();
                    $(
                        #[allow(non_snake_case)]
                        let $arg = match iter.next().and_then(Variant::get_value::<$arg>) {
                            Some(value) => value,
                            None => return Variant::empty(),
                        };
                    )*
                    if iter.next().is_some() {
                        return Variant::empty();
                    }
                    apply_policy((self)($($arg),*), policy)
                })
            }
        }
    };
}

impl_method_fn!();
impl_method_fn!(A0);
impl_method_fn!(A0, A1);
impl_method_fn!(A0, A1, A2);
impl_method_fn!(A0, A1, A2, A3);
impl_method_fn!(A0, A1, A2, A3, A4);
impl_method_fn!(A0, A1, A2, A3, A4, A5);

/// Validate `args` against a declared parameter list and backfill missing
/// trailing parameters from `defaults` (which cover the list's suffix).
///
/// Returns the full argument list on success.
pub(crate) fn match_arguments(
    params: &[ParameterInfo],
    defaults: &[Variant],
    args: &[Variant],
) -> Option<Vec<Variant>> {
    let total = params.len();
    let required = total - defaults.len();
    if args.len() < required || args.len() > total {
        return None;
    }
    for (arg, param) in args.iter().zip(params) {
        if param.ty == std::any::TypeId::of::<Variant>() {
            if !arg.is_valid() {
                return None;
            }
            continue;
        }
        if arg.native_id() != Some(param.ty) {
            return None;
        }
    }
    let mut full = args.to_vec();
    let missing = total - args.len();
    full.extend(defaults[defaults.len() - missing..].iter().cloned());
    Some(full)
}

/// A registered method (or free function).
///
/// Built from any callable accepted by [`MethodFn`], then deposited with
/// [`TypeRegistry::register_method`] /
/// [`TypeRegistry::register_global_method`].
///
/// # Examples
///
/// ```rust
/// use reflekt::{Instance, MethodDesc, TypeRegistry, Variant};
///
/// let registry = TypeRegistry::new();
/// let desc = MethodDesc::new("add", |a: i32, b: i32| a + b);
///
/// let mut unit = Instance::Unit;
/// let result = desc.invoke(&registry, &mut unit, &[Variant::new(2i32), Variant::new(3i32)]);
/// assert_eq!(result.get_value::<i32>(), Some(5));
/// ```
pub struct MethodDesc {
    pub(crate) name: String,
    pub(crate) declaring: TypeId,
    pub(crate) params: Vec<ParameterInfo>,
    pub(crate) defaults: Vec<Variant>,
    pub(crate) policy: ReturnPolicy,
    pub(crate) access: AccessLevel,
    pub(crate) return_native: std::any::TypeId,
    pub(crate) return_type_name: &'static str,
    pub(crate) is_static: bool,
    pub(crate) metadata: DashMap<String, Variant>,
    invoker: Invoker,
}

impl MethodDesc {
    /// Build a method registration from a callable.
    ///
    /// Defaults: value return policy, public access, no default arguments.
    pub fn new<Marker, F>(name: impl Into<String>, method: F) -> Self
    where
        F: MethodFn<Marker>,
    {
        let (return_native, return_type_name) = F::return_info();
        MethodDesc {
            name: name.into(),
            declaring: TypeId::INVALID,
            params: F::parameter_infos(),
            defaults: Vec::new(),
            policy: ReturnPolicy::default(),
            access: AccessLevel::default(),
            return_native,
            return_type_name,
            is_static: F::is_static(),
            metadata: DashMap::new(),
            invoker: method.erase(),
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
    ///
    /// The defaults cover the last `defaults.len()` parameters; a call may
    /// then omit any suffix of them. Supplying more defaults than
    /// parameters truncates from the front.
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

    /// The registered method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric id of the declaring type; invalid for global functions.
    #[must_use]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring
    }

    /// Declared parameter metadata.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.params
    }

    /// Number of parameters that must be supplied (total minus defaults).
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

    /// Compile-time name of the return type.
    #[must_use]
    pub fn return_type_name(&self) -> &str {
        self.return_type_name
    }

    /// `true` when the method takes no receiver.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
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

    /// Invoke with a receiver and arguments.
    ///
    /// The argument count must fall within `[required, total]`; every
    /// supplied argument must hold the declared parameter type exactly.
    /// Returns the empty variant on any mismatch or receiver failure.
    /// A runtime-assembled argument list works the same way — the slice is
    /// the variadic form.
    pub fn invoke(
        &self,
        registry: &TypeRegistry,
        instance: &mut Instance<'_>,
        args: &[Variant],
    ) -> Variant {
        match match_arguments(&self.params, &self.defaults, args) {
            Some(full) => (self.invoker)(registry, instance, &full, self.policy),
            None => Variant::empty(),
        }
    }
}
