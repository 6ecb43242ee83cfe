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

use std::any::{type_name, Any};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use static_assertions::assert_impl_all;

/// An opaque value carried alongside a posted message id.
///
/// The bus never inspects a payload. It is handed unchanged to every binding
/// that declares a parameter, and each binding downcasts it to the type it
/// expects. Cloning is cheap: the value lives behind an `Arc`, so one payload
/// can fan out to many handlers (including ones running on worker threads).
///
/// # Example
///
/// ```rust
/// use busline::prelude::Payload;
///
/// let payload = Payload::new(42_u32);
/// assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
/// assert!(payload.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Payload {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Payload {
    /// Wraps `value` so it can travel through the bus.
    pub fn new<P>(value: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: type_name::<P>(),
        }
    }

    /// Returns a reference to the inner value if it is of type `P`.
    #[must_use]
    pub fn downcast_ref<P: Any>(&self) -> Option<&P> {
        self.value.downcast_ref::<P>()
    }

    /// Returns `true` if the inner value is of type `P`.
    #[must_use]
    pub fn is<P: Any>(&self) -> bool {
        self.value.is::<P>()
    }

    /// The Rust type name of the wrapped value, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

assert_impl_all!(Payload: Send, Sync, Clone);
