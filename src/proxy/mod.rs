// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generated types at run time – dispatch tables, instances, the super
//! invocation bridge and the [`ProxyClass`] handle.
//!
//! A call on an [`Instance`] looks up the slot of the resolved method and
//! either runs the original body, runs the interceptor bound at generation
//! time, or fails because there is no behavior to run.  Matchers are never
//! evaluated here.

mod bridge;
mod class;
mod dispatch;
mod instance;


pub use bridge::SuperInvoke;
pub use class::{ProxyClass, ProxyType};
pub use dispatch::{DispatchTable, Slot};
pub use instance::Instance;
