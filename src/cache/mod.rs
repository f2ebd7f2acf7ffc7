// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proxy type cache – generate once per key, reuse forever.
//!
//! Every distinct [`ProxyTypeKey`] owns a cell that is initialised at most
//! once.  The map lock is only held long enough to find or insert the cell,
//! so a slow generation for one key never blocks requests for another;
//! callers racing on the same key wait on that key's cell and all observe
//! the same [`ProxyType`].  A failed generation drops its cell, so the next
//! request simply tries again.


use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::{ProxyError, TargetType};
use crate::proxy::ProxyType;
use crate::rules::{RuleId, RuleSet};
use crate::{debug_fmt, trace_fmt};

static CURRENT_CONTEXT: Lazy<LoadingContext> = Lazy::new(|| LoadingContext::new("default"));

/// Where generated types are defined. Types generated for different
/// contexts are never shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadingContext {
    id: Uuid,
    name: String,
}

impl LoadingContext {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    /// The process-wide default context.
    pub fn current() -> LoadingContext {
        CURRENT_CONTEXT.clone()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for LoadingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Identity of one generation request. `type_name` is carried for display
/// only; equality and hashing use the type id.
#[derive(Debug, Clone)]
pub struct ProxyTypeKey {
    pub type_id: Uuid,
    pub type_name: String,
    pub rules: Vec<RuleId>,
    pub backend: String,
    pub context: Uuid,
}

impl ProxyTypeKey {
    pub fn new(target: &TargetType, rules: &RuleSet, backend: &str, context: &LoadingContext) -> Self {
        Self {
            type_id: target.id(),
            type_name: target.name().to_string(),
            rules: rules.fingerprint(),
            backend: backend.to_string(),
            context: context.id(),
        }
    }
}

impl PartialEq for ProxyTypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.rules == other.rules
            && self.backend == other.backend
            && self.context == other.context
    }
}

impl Eq for ProxyTypeKey {}

impl Hash for ProxyTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.rules.hash(state);
        self.backend.hash(state);
        self.context.hash(state);
    }
}

impl fmt::Display for ProxyTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} rules, backend={}, context={}]",
            self.type_name,
            self.rules.len(),
            self.backend,
            self.context
        )
    }
}

type Entry = Arc<OnceCell<Arc<ProxyType>>>;

/// Append-only memo of generated proxy types.
#[derive(Debug, Default)]
pub struct ProxyTypeCache {
    entries: Mutex<HashMap<ProxyTypeKey, Entry>>,
}

impl ProxyTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the type cached for `key`, running `generate` if there is none.
    ///
    /// At most one `generate` runs per key at a time and none runs once a
    /// type is stored. Errors are returned to the caller and not stored.
    pub fn get_or_create<F>(&self, key: &ProxyTypeKey, generate: F) -> Result<Arc<ProxyType>, ProxyError>
    where
        F: FnOnce() -> Result<ProxyType, ProxyError>,
    {
        let entry = {
            let mut entries = self.entries.lock();
            entries.entry(key.clone()).or_default().clone()
        };

        if let Some(proxy_type) = entry.get() {
            trace_fmt!("ProxyTypeCache", "hit {}", key);
            return Ok(proxy_type.clone());
        }

        let result = entry.get_or_try_init(|| {
            debug_fmt!("ProxyTypeCache", "generating {}", key);
            generate().map(Arc::new)
        });

        let mut entries = self.entries.lock();
        match result {
            Ok(proxy_type) => {
                // A waiter may have finished on a cell an earlier failure dropped
                entries.entry(key.clone()).or_insert_with(|| entry.clone());
                Ok(proxy_type.clone())
            }
            Err(e) => {
                debug_fmt!("ProxyTypeCache", "generation of {} failed: {}", key, e);
                if entries.get(key).is_some_and(|current| Arc::ptr_eq(current, &entry)) && entry.get().is_none() {
                    entries.remove(key);
                }
                Err(e)
            }
        }
    }

    /// The completed type for `key`, if any.
    pub fn get(&self, key: &ProxyTypeKey) -> Option<Arc<ProxyType>> {
        let entry = self.entries.lock().get(key).cloned()?;
        entry.get().cloned()
    }

    pub fn contains(&self, key: &ProxyTypeKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().values().filter(|e| e.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys held, including generations still in flight.
    pub fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }
}
