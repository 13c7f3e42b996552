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

//! Container lenses over type-erased values.
//!
//! A view is a short-lived lens over the container held inside a
//! [`crate::Variant`]: sequential ([`SequentialView`]), fixed multi-
//! dimensional array ([`ArrayView`]), or associative ([`AssociativeView`]).
//! Views never copy the container — reads clone individual elements into
//! variants, writes go through the variant's own storage.
//!
//! The erased operation tables behind the views are captured when a
//! container type is registered (e.g.
//! [`crate::TypeRegistry::register_sequential`]). A view constructed over a
//! value whose type was never registered as a container is *inert*: it
//! reports zero length and every operation fails. This mirrors the
//! crate-wide rule that misuse yields empty/false results, never a panic.

mod array;
mod associative;
mod sequential;

pub use array::ArrayView;
pub use associative::{AssociativeBacking, AssociativeView, AssociativeViewRef};
pub use sequential::{SequentialBacking, SequentialView, SequentialViewRef};

pub(crate) use array::ArrayAdapter;
pub(crate) use associative::AssociativeAdapter;
pub(crate) use sequential::SequentialAdapter;
