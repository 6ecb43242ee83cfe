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

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use static_assertions::assert_impl_all;
use tracing::{instrument, trace};

use crate::common::bus_inner::BusInner;
use crate::common::config::{BusConfig, CONFIG};
use crate::common::dispatcher;
use crate::message::{BusError, MessageId, Payload};
use crate::traits::MessageHandler;

/// Handle to an in-process message bus.
///
/// Handler objects are registered with [`register`](Self::register); messages
/// posted with the `post*` family are delivered to every live registered
/// object whose type binds the message id. Queued messages are delivered on a
/// single dispatch thread, earliest scheduled time first and in post order for
/// equal times. Bindings marked asynchronous run on a fixed worker pool.
///
/// The bus keeps a strong reference to every registered object until it is
/// unregistered or the bus is released. Callers must unregister objects they
/// want dropped.
///
/// Handles are cheap to clone and share one bus. [`release`](Self::release)
/// shuts the bus down; dropping the last handle does the same.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use busline::prelude::*;
///
/// #[derive(Default)]
/// struct Greeter {
///     greeted: AtomicUsize,
/// }
///
/// #[message_handlers]
/// impl Greeter {
///     #[handle(1)]
///     fn greet(&self, name: &String) {
///         println!("hello {name}");
///         self.greeted.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// # fn main() -> Result<(), BusError> {
/// let bus = MessageBus::with_config(BusConfig::default())?;
/// let greeter = Arc::new(Greeter::default());
/// bus.register(Arc::clone(&greeter))?;
///
/// bus.post_immediate_with(1, Payload::new(String::from("world")));
/// assert_eq!(greeter.greeted.load(Ordering::SeqCst), 1);
///
/// bus.release();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MessageBus(Arc<BusGuard>);

/// Releases the bus when the last public handle goes away.
struct BusGuard(Arc<BusInner>);

impl Drop for BusGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl MessageBus {
    /// Starts a bus configured from the process-wide [`CONFIG`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Spawn`] if the dispatch thread or the worker pool
    /// cannot be started.
    pub fn launch() -> Result<Self, BusError> {
        trace!("Launching message bus with loaded configuration");
        Self::with_config(CONFIG.clone())
    }

    /// Starts a bus with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Spawn`] if the dispatch thread or the worker pool
    /// cannot be started.
    pub fn with_config(config: BusConfig) -> Result<Self, BusError> {
        let inner = BusInner::start(config)?;
        Ok(Self(Arc::new(BusGuard(inner))))
    }

    fn inner(&self) -> &BusInner {
        &self.0 .0
    }

    /// Registers `object` so it receives the messages its type binds.
    ///
    /// The first registration of a type validates and caches its bindings.
    /// Registering the same object twice has no further effect. After
    /// [`release`](Self::release) this does nothing.
    ///
    /// # Errors
    ///
    /// [`BusError::ConflictingBinding`] if a method is marked both synchronous
    /// and asynchronous, [`BusError::InvalidBindingSignature`] if a method
    /// declares more than one parameter. Nothing is registered in either case.
    pub fn register<T: MessageHandler>(&self, object: Arc<T>) -> Result<(), BusError> {
        let inner = self.inner();
        let _shared = inner.lifecycle.read();
        if inner.is_released() {
            trace!("register after release ignored");
            return Ok(());
        }
        inner.registry.register(object)
    }

    /// Stops delivering to `object`.
    ///
    /// Returns `false` if it was not registered. Bindings cached for its type
    /// stay in place.
    pub fn unregister<T: MessageHandler>(&self, object: &Arc<T>) -> bool {
        let inner = self.inner();
        let _shared = inner.lifecycle.read();
        if inner.is_released() {
            return false;
        }
        inner.registry.unregister(object)
    }

    /// Queues `message_id` for delivery as soon as the dispatch thread is free.
    pub fn post(&self, message_id: MessageId) {
        self.enqueue(message_id, None, Duration::ZERO);
    }

    /// Queues `message_id` for delivery no earlier than `delay` from now.
    pub fn post_delayed(&self, message_id: MessageId, delay: Duration) {
        self.enqueue(message_id, None, delay);
    }

    /// Queues `message_id` with `payload`.
    pub fn post_with(&self, message_id: MessageId, payload: Payload) {
        self.enqueue(message_id, Some(payload), Duration::ZERO);
    }

    /// Queues `message_id` with `payload` for delivery after `delay`.
    pub fn post_with_delay(&self, message_id: MessageId, payload: Payload, delay: Duration) {
        self.enqueue(message_id, Some(payload), delay);
    }

    #[instrument(skip(self, payload), level = "trace")]
    fn enqueue(&self, message_id: MessageId, payload: Option<Payload>, delay: Duration) {
        let inner = self.inner();
        let _shared = inner.lifecycle.read();
        if inner.is_released() {
            trace!("post after release ignored");
            return;
        }
        inner.dispatcher.enqueue(message_id, payload, delay);
    }

    /// Delivers `message_id` on the calling thread before returning.
    ///
    /// Bypasses the queue: synchronous bindings run here, asynchronous ones
    /// are still handed to the worker pool.
    pub fn post_immediate(&self, message_id: MessageId) {
        self.deliver_now(message_id, None);
    }

    /// Delivers `message_id` with `payload` on the calling thread.
    pub fn post_immediate_with(&self, message_id: MessageId, payload: Payload) {
        self.deliver_now(message_id, Some(&payload));
    }

    #[instrument(skip(self, payload), level = "trace")]
    fn deliver_now(&self, message_id: MessageId, payload: Option<&Payload>) {
        let inner = self.inner();
        let deliveries = {
            let _shared = inner.lifecycle.read();
            if inner.is_released() {
                trace!("immediate post after release ignored");
                return;
            }
            inner.registry.resolve(message_id)
        };
        dispatcher::deliver(deliveries, payload, &inner.executor, &inner.released);
    }

    /// Shuts the bus down for good.
    ///
    /// Flags the bus released, cancels queued messages, stops the worker pool
    /// (discarding asynchronous invocations that have not started), and
    /// forgets every binding and registered object. Then waits, bounded by
    /// `timeouts.release_join_ms`, for the dispatch thread to finish the
    /// handler it may be running. Calling it again does nothing.
    pub fn release(&self) {
        self.inner().release();
    }

    /// Whether [`release`](Self::release) has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.inner().is_released()
    }

    /// Number of messages waiting on the queue.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner().dispatcher.pending_count()
    }

    /// Number of registered instances of `T`.
    #[must_use]
    pub fn registered_count<T: MessageHandler>(&self) -> usize {
        self.inner().registry.live_count::<T>()
    }

    /// The configuration this bus was started with.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner().config
    }
}

impl Debug for MessageBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("released", &self.is_released())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

assert_impl_all!(MessageBus: Send, Sync, Clone);
