// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Super invocation – running a method's original body from an interceptor.

use crate::core::{MethodDescriptor, ProxyError, Value};
use super::Instance;

/// Handle to the un-intercepted behavior of one method of one instance.
///
/// A fresh bridge is created for every intercepted call. Invoking it runs the
/// original body directly and never goes back through the dispatch table
/// entry of the same method.
#[derive(Debug)]
pub struct SuperInvoke<'a> {
    instance: &'a Instance,
    method: &'a MethodDescriptor,
}

impl<'a> SuperInvoke<'a> {
    pub(crate) fn new(instance: &'a Instance, method: &'a MethodDescriptor) -> Self {
        Self { instance, method }
    }

    /// Returns true if the method has an original body to run.
    pub fn has_super(&self) -> bool {
        !self.method.is_abstract()
    }

    pub fn method(&self) -> &MethodDescriptor {
        self.method
    }

    /// Run the original body with `args`.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, ProxyError> {
        let body = self.method.body().ok_or_else(|| ProxyError::NoSuperBehavior {
            type_name: self.method.declaring_type.clone(),
            method: self.method.signature.to_string(),
        })?;
        self.method.check_args(args)?;
        body(self.instance, args)
    }
}
