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

use crate::common::Bindings;

/// A type whose instances can be registered on a [`MessageBus`](crate::common::MessageBus).
///
/// Implementors list which of their methods handle which message ids. The bus
/// calls [`declare`](Self::declare) once per distinct type, the first time an
/// instance of it is registered, and caches the result for later registrations.
///
/// Most implementations are generated by the
/// [`message_handlers`](busline_macro::message_handlers) attribute, but the
/// trait can be written by hand:
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use busline::prelude::*;
///
/// #[derive(Default)]
/// struct Counter {
///     hits: AtomicUsize,
/// }
///
/// impl MessageHandler for Counter {
///     fn declare(bindings: &mut Bindings<Self>) {
///         bindings.handle(1, "hit", |counter: &Counter| {
///             counter.hits.fetch_add(1, Ordering::SeqCst);
///         });
///     }
/// }
/// ```
pub trait MessageHandler: Send + Sync + Sized + 'static {
    /// Adds this type's handler bindings to `bindings`.
    fn declare(bindings: &mut Bindings<Self>);
}
