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

//! Built-in primitive type registrations.
//!
//! Installed into every registry at construction so that numeric handles,
//! conversion and dispatch work for the fundamental types without any
//! user registration.

use super::{registry::TypeRegistry, TypeFlags};

pub(crate) fn install(registry: &TypeRegistry) {
    registry.register_builtin::<()>("()", TypeFlags::PRIMITIVE);
    registry.register_builtin::<bool>("bool", TypeFlags::PRIMITIVE | TypeFlags::BOOLEAN);
    registry.register_builtin::<char>("char", TypeFlags::PRIMITIVE);

    let signed = TypeFlags::PRIMITIVE | TypeFlags::ARITHMETIC | TypeFlags::SIGNED_INTEGER;
    registry.register_builtin::<i8>("i8", signed);
    registry.register_builtin::<i16>("i16", signed);
    registry.register_builtin::<i32>("i32", signed);
    registry.register_builtin::<i64>("i64", signed);

    let unsigned = TypeFlags::PRIMITIVE | TypeFlags::ARITHMETIC | TypeFlags::UNSIGNED_INTEGER;
    registry.register_builtin::<u8>("u8", unsigned);
    registry.register_builtin::<u16>("u16", unsigned);
    registry.register_builtin::<u32>("u32", unsigned);
    registry.register_builtin::<u64>("u64", unsigned);

    let float = TypeFlags::PRIMITIVE | TypeFlags::ARITHMETIC | TypeFlags::FLOATING_POINT;
    registry.register_builtin::<f32>("f32", float);
    registry.register_builtin::<f64>("f64", float);

    registry.register_builtin::<String>("String", TypeFlags::PRIMITIVE | TypeFlags::STRING);
}
