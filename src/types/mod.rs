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

//! Type identity, descriptors and the registry.
//!
//! The model has three layers:
//!
//! - [`TypeId`] — a small, copyable numeric id, stable for the lifetime of
//!   a registry. Id 0 is the invalid sentinel.
//! - [`Type`] — a cheap cloneable handle over the shared descriptor, the
//!   unit of all metadata queries. Handles held across a module unload
//!   flip to invalid rather than dangle.
//! - [`TypeRegistry`] — the explicit root object owning all registrations;
//!   see its documentation for the full API.

mod descriptor;
mod module;
mod primitives;
mod registry;

pub use descriptor::{Type, TypeFlags, TypeId};
pub use module::ModuleId;
pub use registry::{MemberFilter, TypeRegistry};
