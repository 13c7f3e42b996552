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

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # reflekt
//!
//! [![Crates.io](https://img.shields.io/crates/v/reflekt.svg)](https://crates.io/crates/reflekt)
//! [![Documentation](https://docs.rs/reflekt/badge.svg)](https://docs.rs/reflekt)
//!
//! Runtime type reflection for Rust: register types, properties, methods,
//! constructors, enumerations and conversions at startup, then inspect and
//! invoke them dynamically at run time — by name, from scripts, editors,
//! serializers or plugins — without knowing the concrete types at compile
//! time.
//!
//! ## Features
//!
//! - **📇 Explicit registries** - No global state; every registration lives
//!   in a [`TypeRegistry`] the embedder owns, and independent registries
//!   never interfere
//! - **🪪 Stable type identity** - Every registered type gets a small
//!   numeric [`TypeId`], identical no matter how the type is looked up
//! - **📦 Type-erased values** - [`Variant`] carries any registered value
//!   through calls, with weak-total comparison and a layered conversion
//!   chain
//! - **🧬 Composition-modeled inheritance** - Base classes are registered
//!   as projections, so base members and upcasts work without any layout
//!   assumptions
//! - **🪟 Container lenses** - Uniform sequential, associative and
//!   fixed-array views over registered containers
//! - **🔌 Plugin lifecycles** - Types registered by a dynamically loaded
//!   module vanish again on unload, and stale handles turn invalid instead
//!   of dangling
//! - **🛡️ Panic-free dispatch** - Mismatched names, arities or argument
//!   types report failure as empty variants and `false`, never a panic
//!
//! ## Quick Start
//!
//! Add `reflekt` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! reflekt = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust
//! use reflekt::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//! reflect_type!(Point: eq);
//!
//! let registry = TypeRegistry::new();
//! registry.register::<Point>("Point")?;
//! registry.register_constructor::<Point>(ConstructorDesc::new(|x: i32, y: i32| Point { x, y }))?;
//! registry.register_method::<Point>(MethodDesc::new("length2", |p: &Point| p.x * p.x + p.y * p.y))?;
//!
//! // Construct and call by name, with type-erased values.
//! let point = registry.create_by_name("Point", &[Variant::new(3i32), Variant::new(4i32)]);
//! let mut inst = Instance::from_variant(&point);
//! let len2 = registry.invoke(&mut inst, "length2", &[]);
//! assert_eq!(len2.get_value::<i32>(), Some(25));
//! # Ok::<(), reflekt::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `reflekt` is organized into a handful of cooperating pieces:
//!
//! - [`prelude`] - Convenient re-exports of the commonly used surface
//! - [`TypeRegistry`] - Registration, lookup, dispatch and the plugin
//!   module lifecycle
//! - [`Type`] / [`TypeId`] - Cheap handles and stable numeric type identity
//! - [`Variant`] - The type-erased value every dynamic call traffics in
//! - [`convert`] - Built-in conversion rules and the user converter table
//! - [`MethodDesc`] / [`ConstructorDesc`] / [`PropertyDesc`] - Erased
//!   member descriptors with exact-type argument matching
//! - [`SequentialView`] / [`AssociativeView`] / [`ArrayView`] - Uniform
//!   container lenses
//!
//! ## Error Handling
//!
//! Dynamic dispatch is expected to miss: a script may name a method that
//! does not exist or pass the wrong argument types. All such failures are
//! soft — empty variants, invalid handles, `false` returns — and never
//! panic. The [`Error`] enum is reserved for registration conflicts and
//! module lifecycle mismatches, where degrading silently would hide a real
//! bug in the embedding program:
//!
//! ```rust
//! use reflekt::{Error, TypeRegistry, reflect_type};
//!
//! #[derive(Clone, Debug)]
//! struct A;
//! reflect_type!(A);
//! #[derive(Clone, Debug)]
//! struct B;
//! reflect_type!(B);
//!
//! let registry = TypeRegistry::new();
//! registry.register::<A>("Thing").unwrap();
//! match registry.register::<B>("Thing") {
//!     Err(Error::DuplicateTypeName { name }) => assert_eq!(name, "Thing"),
//!     other => panic!("expected a name conflict, got {other:?}"),
//! }
//! ```

pub mod convert;

mod enumeration;
mod error;
mod invoke;
mod types;
mod value;
mod variant;
mod views;

pub mod prelude;

pub use enumeration::{EnumDesc, EnumEntry};
pub use error::{Error, Result};
pub use invoke::{
    AccessLevel, Argument, ConstructorDesc, Instance, MethodDesc, MethodFn, NoRecv, ParameterInfo,
    PropertyDesc, RecvMut, RecvRef, ReturnPolicy,
};
pub use types::{MemberFilter, ModuleId, Type, TypeFlags, TypeId, TypeRegistry};
pub use value::ReflectValue;
pub use variant::Variant;
pub use views::{
    ArrayView, AssociativeBacking, AssociativeView, AssociativeViewRef, SequentialBacking,
    SequentialView, SequentialViewRef,
};
