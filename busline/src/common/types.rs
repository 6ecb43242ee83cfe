/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Type aliases shared by the registry, dispatcher and executor.

use std::any::Any;
use std::sync::Arc;

use crate::message::{InvocationError, Payload};

/// A registered handler object with its concrete type erased.
///
/// The registry owns one strong reference per registration until the object is
/// unregistered or the bus is released.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Typed callable produced by a [`BindingDecl`](crate::common::BindingDecl).
pub(crate) type Invoker<T> =
    Arc<dyn Fn(&T, Option<&Payload>) -> Result<(), InvocationError> + Send + Sync + 'static>;

/// Callable after type erasure; downcasts the instance before calling through.
pub(crate) type ErasedInvoker = Arc<
    dyn Fn(&(dyn Any + Send + Sync), Option<&Payload>) -> Result<(), InvocationError>
        + Send
        + Sync
        + 'static,
>;

/// A unit of asynchronous work handed to the worker pool.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Identity of a registered instance: the address of its `Arc` allocation.
pub(crate) fn instance_key(instance: &Instance) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}
