// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Objects of target and generated proxy types.

use std::sync::Arc;
use parking_lot::RwLock;

use super::dispatch::{DispatchTable, Slot};
use super::SuperInvoke;
use crate::core::{
    ConstructorDescriptor, MethodSignature, ProxyError, TargetType, TypeKind, Value, ValueType,
};
use crate::reflect;

/// An object: a shared dispatch table plus its own fields.
///
/// Calls are dispatched through the table, so a body calling another method
/// on its receiver sees the interception of the generated type.
#[derive(Debug)]
pub struct Instance {
    table: Arc<DispatchTable>,
    fields: RwLock<serde_json::Map<String, Value>>,
    proxy: bool,
}

impl Instance {
    pub(crate) fn new(table: Arc<DispatchTable>, proxy: bool) -> Self {
        Self {
            table,
            fields: RwLock::new(serde_json::Map::new()),
            proxy,
        }
    }

    pub fn type_name(&self) -> &str {
        self.table.type_name()
    }

    /// Returns true for instances of generated proxy types.
    pub fn is_proxy(&self) -> bool {
        self.proxy
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.table.has_method(name)
    }

    /// Call a method by name; overloads are resolved on the arguments.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ProxyError> {
        let slot = self.table.resolve(name, args)?;
        self.dispatch(slot, args)
    }

    /// Call the method with exactly this signature.
    pub fn invoke_exact(&self, signature: &MethodSignature, args: &[Value]) -> Result<Value, ProxyError> {
        let slot = self.table.slot(signature).ok_or_else(|| ProxyError::NoSuchMethod {
            type_name: self.type_name().to_string(),
            method: signature.to_string(),
        })?;
        slot.method().check_args(args)?;
        self.dispatch(slot, args)
    }

    fn dispatch(&self, slot: &Slot, args: &[Value]) -> Result<Value, ProxyError> {
        match slot {
            Slot::Intercepted { rule, method } => {
                let interceptor = self.table.interceptor(*rule).ok_or_else(|| {
                    ProxyError::UnsupportedRule(format!("rule #{rule} is not part of '{}'", self.type_name()))
                })?;
                let super_invoke = SuperInvoke::new(self, method);
                let result = interceptor.intercept(self, method, &super_invoke, args)?;

                if !method.return_type.accepts(&result) {
                    let err = ProxyError::InterceptionTypeMismatch {
                        method: format!("{}::{}", self.type_name(), method.signature),
                        expected: method.return_type,
                        actual: ValueType::of(&result),
                    };
                    log::debug!("{err}");
                    return Err(err);
                }
                Ok(result)
            }
            Slot::Direct { method } => SuperInvoke::new(self, method).invoke(args),
            Slot::Abstract { method } | Slot::Unimplemented { method } => {
                Err(ProxyError::NoSuperBehavior {
                    type_name: self.type_name().to_string(),
                    method: method.signature.to_string(),
                })
            }
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field<V: Into<Value>>(&self, name: &str, value: V) {
        self.fields.write().insert(name.to_string(), value.into());
    }
}

/// Create an instance over `table` and run the constructor's initializer.
pub(crate) fn construct(
    table: &Arc<DispatchTable>,
    constructor: &ConstructorDescriptor,
    args: &[Value],
    proxy: bool,
) -> Result<Instance, ProxyError> {
    let instance = Instance::new(table.clone(), proxy);
    if let Some(init) = constructor.init() {
        init(&instance, args).map_err(|e| ProxyError::ConstructionFailure {
            type_name: table.type_name().to_string(),
            reason: "constructor failed".to_string(),
            source: Some(Box::new(e)),
        })?;
    }
    Ok(instance)
}

impl TargetType {
    /// Create a plain, un-proxied instance of a concrete class.
    pub fn new_instance(&self, args: &[Value]) -> Result<Instance, ProxyError> {
        if self.kind() != TypeKind::Class || self.is_abstract() {
            return Err(ProxyError::construction(self.name(), format!("{self} is not concrete")));
        }

        let table = Arc::new(DispatchTable::plain(self));
        if !table.is_instantiable() {
            return Err(ProxyError::construction(self.name(), "type has abstract methods"));
        }

        let implicit;
        let constructor = if self.declared_constructors().is_empty() && args.is_empty() {
            implicit = ConstructorDescriptor::no_args();
            &implicit
        } else {
            reflect::find_constructor(self.declared_constructors(), args)
                .map(|c| c.as_ref())
                .ok_or_else(|| {
                    ProxyError::construction(self.name(), "no constructor accepts the arguments")
                })?
        };

        construct(&table, constructor, args, false)
    }
}
