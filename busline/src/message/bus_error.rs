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

use thiserror::Error;

/// Errors surfaced to callers of the bus.
///
/// Only mistakes that can be discovered while registering a handler are
/// reported this way; everything that goes wrong while delivering a message is
/// an [`InvocationError`] and is logged instead of returned.
#[derive(Debug, Error)]
pub enum BusError {
    /// A method was marked as both a synchronous and an asynchronous handler.
    #[error("{owner}::{method} cannot be both a synchronous and an asynchronous handler")]
    ConflictingBinding {
        /// Type declaring the method.
        owner: &'static str,
        /// Name of the offending method.
        method: &'static str,
    },
    /// A handler method declared more than one parameter.
    #[error("{owner}::{method} declares {arity} parameters; handlers take at most one")]
    InvalidBindingSignature {
        /// Type declaring the method.
        owner: &'static str,
        /// Name of the offending method.
        method: &'static str,
        /// Number of parameters the method declared.
        arity: usize,
    },
    /// A bus thread or the worker runtime could not be started.
    #[error("failed to start {component}")]
    Spawn {
        /// The component that failed to start.
        component: &'static str,
        /// Underlying I/O error from the OS or the runtime builder.
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single handler invocation.
///
/// Caught at the dispatch boundary, logged, and never propagated to the
/// poster. Delivery continues with the next binding.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The payload was absent or of a different type than the handler parameter.
    #[error("payload type mismatch: expected {expected}, found {found}")]
    PayloadTypeMismatch {
        /// Parameter type the handler declared.
        expected: &'static str,
        /// Type of the posted payload, or `<none>`.
        found: &'static str,
    },
    /// A registered instance was not of the binding's owning type.
    #[error("instance is not a {expected}")]
    InstanceMismatch {
        /// The binding's owning type.
        expected: &'static str,
    },
    /// The handler returned an error.
    #[error("handler returned an error: {0:#}")]
    Handler(anyhow::Error),
    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}
