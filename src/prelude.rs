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

//! # reflekt Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types and traits of the library. Import it to get quick access to the
//! essential reflection surface.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The error type for registration and module lifecycle operations
pub use crate::Error;

/// The result type used throughout reflekt
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The registry every registration and lookup goes through
pub use crate::TypeRegistry;

/// Value erasure trait and its implementing macro
pub use crate::{reflect_type, ReflectValue};

// ================================================================================================
// Type Identity
// ================================================================================================

/// Type handles, identity and trait flags
pub use crate::{MemberFilter, ModuleId, Type, TypeFlags, TypeId};

// ================================================================================================
// Values and Conversion
// ================================================================================================

/// The type-erased value container
pub use crate::Variant;

/// User conversion table (owned by the registry)
pub use crate::convert::ConverterTable;

// ================================================================================================
// Members and Dispatch
// ================================================================================================

/// Member descriptors and invocation types
pub use crate::{
    AccessLevel, Argument, ConstructorDesc, Instance, MethodDesc, ParameterInfo, PropertyDesc,
    ReturnPolicy,
};

/// Enumeration metadata
pub use crate::{EnumDesc, EnumEntry};

// ================================================================================================
// Container Views
// ================================================================================================

/// Sequential, associative and fixed-array lenses
pub use crate::{
    ArrayView, AssociativeBacking, AssociativeView, AssociativeViewRef, SequentialBacking,
    SequentialView, SequentialViewRef,
};
