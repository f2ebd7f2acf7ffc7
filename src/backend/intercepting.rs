// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intercepting backend – the default, handles classes and interfaces.

use super::{emit_interface, emit_subclass, AbstractPolicy, Backend, Capabilities, INTERCEPTING};
use crate::cache::LoadingContext;
use crate::core::{ProxyError, TargetType, TypeKind};
use crate::proxy::ProxyType;
use crate::rules::RuleSet;

/// Subclasses classes and implements interfaces. Unlike the interface
/// backend, an interface proxy is only instantiable once every abstract
/// method is covered by a rule.
#[derive(Debug, Default)]
pub struct InterceptingBackend;

impl Backend for InterceptingBackend {
    fn name(&self) -> &str {
        INTERCEPTING
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            interfaces: true,
            classes: true,
        }
    }

    fn generate(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
    ) -> Result<ProxyType, ProxyError> {
        match target.kind() {
            TypeKind::Interface => {
                emit_interface(INTERCEPTING, target, rules, context, AbstractPolicy::LeaveAbstract)
            }
            _ => emit_subclass(INTERCEPTING, target, rules, context),
        }
    }
}
