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

//! Container lenses over variants: sequential, associative and fixed-array
//! views.

use std::collections::{HashMap, HashSet};

use reflekt::prelude::*;

#[test]
fn sequential_view_edits_in_place() {
    let registry = TypeRegistry::new();
    registry.register_sequential::<Vec<i32>>("Vec<i32>").unwrap();

    let mut v = Variant::new(vec![1i32, 2, 3]);
    assert!(v.is_sequential_container(&registry));

    let mut view = v.create_sequential_view(&registry);
    assert!(view.is_valid());
    assert!(view.is_dynamic());
    assert_eq!(view.len(), 3);
    assert_eq!(view.value_type().name(), "i32");

    assert!(view.set(0, Variant::new(9i32)));
    assert!(view.insert(1, Variant::new(5i32)));
    assert!(view.erase(3));
    assert!(view.set_size(6));
    assert_eq!(view.len(), 6);
    assert_eq!(view.get(5).get_value::<i32>(), Some(0));

    drop(view);
    assert_eq!(v.get_value::<Vec<i32>>(), Some(vec![9, 5, 2, 0, 0, 0]));
}

#[test]
fn sequential_view_rejects_bad_operations() {
    let registry = TypeRegistry::new();
    registry.register_sequential::<Vec<i32>>("Vec<i32>").unwrap();

    let mut v = Variant::new(vec![1i32]);
    let mut view = v.create_sequential_view(&registry);
    // Out of range and wrong element type both fail softly.
    assert!(!view.set(5, Variant::new(1i32)));
    assert!(!view.set(0, Variant::from("wrong")));
    assert!(!view.get(5).is_valid());

    // An unregistered container gives an inert view.
    let mut other = Variant::new(vec![1u8]);
    let view = other.create_sequential_view(&registry);
    assert!(!view.is_valid());
    assert_eq!(view.len(), 0);
}

#[test]
fn fixed_array_as_sequence_refuses_resizing() {
    let registry = TypeRegistry::new();
    registry.register_array1::<i32, 3>("i32[3]").unwrap();

    let mut v = Variant::new([1i32, 2, 3]);
    let ty = v.get_type(&registry);
    assert!(ty.is_array());
    assert!(ty.is_sequential_container());

    let mut view = v.create_sequential_view(&registry);
    assert!(!view.is_dynamic());
    assert_eq!(view.len(), 3);
    assert!(view.set(1, Variant::new(9i32)));
    assert!(!view.insert(0, Variant::new(0i32)));
    assert!(!view.erase(0));
    assert!(!view.set_size(5));
    assert!(!view.clear());

    drop(view);
    assert_eq!(v.get_value::<[i32; 3]>(), Some([1, 9, 3]));
}

#[test]
fn associative_map_view() {
    let registry = TypeRegistry::new();
    registry
        .register_associative::<HashMap<String, i32>>("HashMap<String, i32>")
        .unwrap();

    let mut v = Variant::new(HashMap::from([("a".to_string(), 1i32)]));
    assert!(v.is_associative_container(&registry));

    let mut view = v.create_associative_view(&registry);
    assert!(!view.is_key_only());
    assert_eq!(view.key_type().name(), "String");
    assert_eq!(view.value_type().name(), "i32");

    assert!(view.insert_pair(Variant::from("b"), Variant::new(2i32)));
    // Overwrite, not duplicate.
    assert!(view.insert_pair(Variant::from("a"), Variant::new(10i32)));
    assert_eq!(view.len(), 2);
    assert_eq!(view.get(&Variant::from("a")).get_value::<i32>(), Some(10));
    assert!(view.contains(&Variant::from("b")));
    assert!(!view.contains(&Variant::from("c")));
    // Bare-key insertion is a set operation.
    assert!(!view.insert(Variant::from("c")));

    assert_eq!(view.erase(&Variant::from("b")), 1);
    assert_eq!(view.erase(&Variant::from("b")), 0);
    assert!(view.clear());
    assert!(view.is_empty());
}

#[test]
fn associative_set_view_is_key_only() {
    let registry = TypeRegistry::new();
    registry
        .register_associative::<HashSet<i32>>("HashSet<i32>")
        .unwrap();

    let mut v = Variant::new(HashSet::from([1i32, 2]));
    let mut view = v.create_associative_view(&registry);
    assert!(view.is_key_only());

    assert!(view.insert(Variant::new(3i32)));
    assert!(!view.insert_pair(Variant::new(4i32), Variant::new(4i32)));
    assert_eq!(view.len(), 3);
    // Lookup on a set returns the stored key.
    assert_eq!(view.get(&Variant::new(2i32)).get_value::<i32>(), Some(2));

    drop(view);
    let read = v.create_associative_view_ref(&registry);
    let mut keys: Vec<i32> = read
        .entries()
        .into_iter()
        .filter_map(|(k, _)| k.get_value::<i32>())
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn array_view_addresses_by_rank() {
    let registry = TypeRegistry::new();
    registry.register_array2::<i32, 2, 3>("i32[2][3]").unwrap();

    let mut v = Variant::new([[1i32, 2, 3], [4, 5, 6]]);
    let mut view = v.create_array_view(&registry);
    assert!(view.is_valid());
    assert_eq!(view.rank(), 2);
    assert_eq!(view.size(&[]), Some(2));
    assert_eq!(view.size(&[0]), Some(3));
    assert_eq!(view.size(&[0, 0]), None);
    assert_eq!(view.rank_type(2).name(), "i32");

    assert_eq!(view.get(&[1, 2]).get_value::<i32>(), Some(6));
    assert!(view.set(&[0, 1], Variant::new(9i32)));
    // A partial index addresses a whole row.
    assert_eq!(view.get(&[1]).get_value::<[i32; 3]>(), Some([4, 5, 6]));
    assert!(view.set(&[1], Variant::new([7i32, 8, 9])));
    // Out of range fails softly.
    assert!(!view.set(&[5, 0], Variant::new(0i32)));
    assert!(!view.get(&[0, 9]).is_valid());

    drop(view);
    assert_eq!(
        v.get_value::<[[i32; 3]; 2]>(),
        Some([[1, 9, 3], [7, 8, 9]])
    );
}
