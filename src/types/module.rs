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

//! Plugin module identity and ownership tracking.
//!
//! Types, members and converters registered while a plugin module is active
//! are attributed to that module so that unloading can remove exactly its
//! contributions. The registry does not load libraries itself — a dynamic
//! loader calls [`crate::TypeRegistry::notify_module_loaded`] /
//! [`crate::TypeRegistry::notify_module_unloaded`] around its own dlopen /
//! dlclose equivalent.

use std::fmt;

/// Identity of a registration origin.
///
/// [`ModuleId::MAIN`] is the host application itself; plugin loaders mint
/// non-zero ids for loaded libraries. The id value is chosen by the loader
/// and only needs to be unique among concurrently loaded modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    /// The host application: registrations that survive for the process
    /// lifetime.
    pub const MAIN: ModuleId = ModuleId(0);

    /// Create a module id from a loader-chosen value.
    ///
    /// Value `0` is reserved for [`ModuleId::MAIN`].
    #[must_use]
    pub const fn new(value: u32) -> Self {
        ModuleId(value)
    }

    /// The raw id value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// `true` for plugin modules (everything except [`ModuleId::MAIN`]).
    #[must_use]
    pub const fn is_plugin(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plugin() {
            write!(f, "module#{}", self.0)
        } else {
            f.write_str("main")
        }
    }
}
