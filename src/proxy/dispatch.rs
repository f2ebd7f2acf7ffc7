// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-type decision table, built once at generation time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{MethodDescriptor, MethodSignature, ProxyError, Value};
use crate::reflect;
use crate::rules::{Interceptor, RuleSet};
use crate::core::TargetType;

/// What a call to one method of a generated type does.
#[derive(Debug, Clone)]
pub enum Slot {
    /// Run the interceptor of rule `rule`
    Intercepted { rule: usize, method: Arc<MethodDescriptor> },
    /// Run the original (or default) body
    Direct { method: Arc<MethodDescriptor> },
    /// No body and no rule; the type cannot be instantiated
    Abstract { method: Arc<MethodDescriptor> },
    /// No body and no rule, stubbed to fail on every call
    Unimplemented { method: Arc<MethodDescriptor> },
}

impl Slot {
    pub fn method(&self) -> &Arc<MethodDescriptor> {
        match self {
            Slot::Intercepted { method, .. }
            | Slot::Direct { method }
            | Slot::Abstract { method }
            | Slot::Unimplemented { method } => method,
        }
    }

    pub fn is_intercepted(&self) -> bool {
        matches!(self, Slot::Intercepted { .. })
    }
}

/// Signature → slot mapping of one type.
#[derive(Debug)]
pub struct DispatchTable {
    type_name: String,
    rules: RuleSet,
    slots: Vec<Slot>,
    by_signature: HashMap<MethodSignature, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl DispatchTable {
    pub fn new(type_name: &str, rules: RuleSet) -> Self {
        Self {
            type_name: type_name.to_string(),
            rules,
            slots: Vec::new(),
            by_signature: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Table of an un-proxied type: every method runs its own body.
    pub fn plain(target: &TargetType) -> Self {
        let mut table = Self::new(target.name(), RuleSet::empty());
        for method in reflect::instance_methods(target).iter() {
            let slot = if method.is_abstract() {
                Slot::Abstract { method: method.clone() }
            } else {
                Slot::Direct { method: method.clone() }
            };
            table.push(slot);
        }
        table
    }

    /// Append a slot. A signature already present keeps its first slot.
    pub fn push(&mut self, slot: Slot) {
        let signature = slot.method().signature.clone();
        if self.by_signature.contains_key(&signature) {
            return;
        }
        let idx = self.slots.len();
        self.by_name.entry(signature.name.clone()).or_default().push(idx);
        self.by_signature.insert(signature, idx);
        self.slots.push(slot);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, signature: &MethodSignature) -> Option<&Slot> {
        self.by_signature.get(signature).map(|&idx| &self.slots[idx])
    }

    pub fn interceptor(&self, rule: usize) -> Option<&Arc<dyn Interceptor>> {
        self.rules.get(rule).map(|r| r.interceptor())
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn is_instantiable(&self) -> bool {
        !self.slots.iter().any(|s| matches!(s, Slot::Abstract { .. }))
    }

    /// Signatures left without any behavior.
    pub fn abstract_methods(&self) -> Vec<&MethodSignature> {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Abstract { .. }))
            .map(|s| &s.method().signature)
            .collect()
    }

    /// Overload resolution: first declared method of that name whose
    /// parameters accept the arguments.
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<&Slot, ProxyError> {
        let candidates = self.by_name.get(name).ok_or_else(|| ProxyError::NoSuchMethod {
            type_name: self.type_name.clone(),
            method: name.to_string(),
        })?;

        let mut first_error = None;
        for &idx in candidates {
            let slot = &self.slots[idx];
            match slot.method().check_args(args) {
                Ok(()) => return Ok(slot),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| ProxyError::NoSuchMethod {
            type_name: self.type_name.clone(),
            method: name.to_string(),
        }))
    }
}
