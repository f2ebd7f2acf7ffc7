// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subclass backend – proxies concrete and abstract classes.

use super::{emit_subclass, Backend, Capabilities, SUBCLASS};
use crate::cache::LoadingContext;
use crate::core::{ProxyError, TargetType};
use crate::proxy::ProxyType;
use crate::rules::RuleSet;

/// Generates a subtype of a class, overriding the public and protected
/// non-final methods a rule matches.
#[derive(Debug, Default)]
pub struct SubclassBackend;

impl Backend for SubclassBackend {
    fn name(&self) -> &str {
        SUBCLASS
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            interfaces: false,
            classes: true,
        }
    }

    fn generate(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
    ) -> Result<ProxyType, ProxyError> {
        emit_subclass(SUBCLASS, target, rules, context)
    }
}
