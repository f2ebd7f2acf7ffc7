// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interface backend – dynamic implementations of interfaces.

use super::{emit_interface, AbstractPolicy, Backend, Capabilities, INTERFACE};
use crate::cache::LoadingContext;
use crate::core::{ProxyError, TargetType};
use crate::proxy::ProxyType;
use crate::rules::RuleSet;

/// Implements an interface on the fly. The result is always constructible
/// with no arguments: abstract methods no rule matched fail with
/// `NoSuperBehavior` when called.
#[derive(Debug, Default)]
pub struct InterfaceBackend;

impl Backend for InterfaceBackend {
    fn name(&self) -> &str {
        INTERFACE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            interfaces: true,
            classes: false,
        }
    }

    fn generate(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
    ) -> Result<ProxyType, ProxyError> {
        emit_interface(INTERFACE, target, rules, context, AbstractPolicy::Stub)
    }
}
