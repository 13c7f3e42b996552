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

//! Erased invocation: constructors, methods and properties.
//!
//! Registration erases a plain Rust function or closure into an invoker
//! that takes a receiver ([`Instance`]) and a slice of [`crate::Variant`]
//! arguments. Dispatch is strict: the supplied argument count must fall in
//! the declared `[required, total]` window, every supplied argument must
//! hold the declared parameter type exactly (a parameter declared as
//! `Variant` accepts anything), and missing trailing parameters are filled
//! from registered default values. There is no implicit-conversion
//! ranking; a near-miss is simply not a match.
//!
//! Every failure path — receiver of the wrong type, read-only instance for
//! a mutating call, argument mismatch — yields an empty variant or `false`,
//! never a panic.

mod argument;
mod constructor;
mod instance;
mod method;
mod parameter;
mod policy;
mod property;

pub use argument::Argument;
pub use constructor::ConstructorDesc;
pub use instance::Instance;
pub use method::{MethodDesc, MethodFn, NoRecv, RecvMut, RecvRef};
pub use parameter::{AccessLevel, ParameterInfo};
pub use policy::ReturnPolicy;
pub use property::PropertyDesc;
