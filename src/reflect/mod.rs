// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Method and constructor lookup over [`TargetType`] hierarchies.
//!
//! Lookup order is deterministic: the type's own declarations, then the
//! superclass chain, then implemented interfaces (depth first, declaration
//! order).  The first declaration of a signature wins, so overrides shadow
//! the methods they override.  Method lists are memoised on the type and
//! freed with it.


use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{ConstructorDescriptor, MethodDescriptor, MethodSignature, TargetType, Value, ValueType, Visibility};

type MethodList = Arc<Vec<Arc<MethodDescriptor>>>;

/// Every non-static method callable on an instance of `target`, most-derived
/// declaration first.
pub fn instance_methods(target: &TargetType) -> MethodList {
    target
        .instance_methods_memo()
        .get_or_init(|| {
            let mut seen_types = HashSet::new();
            let mut seen_signatures = HashSet::new();
            let mut methods = Vec::new();
            collect(target, &mut seen_types, &mut seen_signatures, &mut methods);
            Arc::new(methods)
        })
        .clone()
}

fn collect(
    target: &TargetType,
    seen_types: &mut HashSet<Uuid>,
    seen_signatures: &mut HashSet<MethodSignature>,
    out: &mut Vec<Arc<MethodDescriptor>>,
) {
    if !seen_types.insert(target.id()) {
        return;
    }

    for method in target.declared_methods() {
        if method.is_static {
            continue;
        }
        if seen_signatures.insert(method.signature.clone()) {
            out.push(method.clone());
        }
    }

    if let Some(superclass) = target.superclass() {
        collect(superclass, seen_types, seen_signatures, out);
    }

    for interface in target.interfaces() {
        collect(interface, seen_types, seen_signatures, out);
    }
}

/// Methods a generated subtype may replace.
pub fn overridable_methods(target: &TargetType) -> Vec<Arc<MethodDescriptor>> {
    instance_methods(target)
        .iter()
        .filter(|m| can_override(m))
        .cloned()
        .collect()
}

/// Non-static, non-final and visible to subtypes.
pub fn can_override(method: &MethodDescriptor) -> bool {
    !method.is_static
        && !method.is_final
        && matches!(method.visibility, Visibility::Public | Visibility::Protected)
}

/// First constructor whose parameters accept `args`.
pub fn find_constructor<'a>(
    constructors: &'a [Arc<ConstructorDescriptor>],
    args: &[Value],
) -> Option<&'a Arc<ConstructorDescriptor>> {
    constructors
        .iter()
        .filter(|c| c.visibility != Visibility::Private)
        .find(|c| c.accepts(args))
}

/// Constructor declared with exactly `params`.
pub fn find_constructor_exact<'a>(
    constructors: &'a [Arc<ConstructorDescriptor>],
    params: &[ValueType],
) -> Option<&'a Arc<ConstructorDescriptor>> {
    constructors
        .iter()
        .filter(|c| c.visibility != Visibility::Private)
        .find(|c| c.params == params)
}
