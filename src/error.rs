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

//! Error types for registration and module lifecycle operations.
//!
//! Errors are deliberately rare in this crate: lookups, conversions and
//! dispatch report failure through invalid handles, empty variants and
//! `false` returns. [`Error`] covers the few operations where silently
//! degrading would hide a real bug in the embedding program — conflicting
//! name registrations and mismatched module lifecycle notifications.

use thiserror::Error;

use crate::types::ModuleId;

/// Registration and module lifecycle errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The display name is already registered to a different compile-time
    /// type. Re-registering the *same* type under its existing name is
    /// idempotent and does not produce this error.
    #[error("type name '{name}' is already registered to a different type")]
    DuplicateTypeName {
        /// The conflicting display name.
        name: String,
    },

    /// An operation referenced a type that was never registered (or was
    /// removed by a module unload).
    #[error("type '{name}' is not registered")]
    TypeNotRegistered {
        /// The compile-time name of the missing type.
        name: String,
    },

    /// A module lifecycle notification referenced a module that is not
    /// currently loaded.
    #[error("module {module} is not loaded")]
    ModuleNotLoaded {
        /// The module in question.
        module: ModuleId,
    },

    /// A load notification arrived for a module that is already loaded.
    #[error("module {module} is already loaded")]
    ModuleAlreadyLoaded {
        /// The module in question.
        module: ModuleId,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_subject() {
        let err = Error::DuplicateTypeName {
            name: "Point".to_string(),
        };
        assert!(err.to_string().contains("Point"));

        let err = Error::ModuleNotLoaded {
            module: ModuleId::new(3),
        };
        assert!(err.to_string().contains("module#3"));
    }
}
