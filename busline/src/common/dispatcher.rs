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

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};

use crate::common::executor::AsyncExecutor;
use crate::common::registry::{Delivery, HandlerRegistry};
use crate::message::{MessageId, Payload, PendingMessage};

/// Time-ordered queue drained by the dispatch thread.
///
/// Earliest scheduled time first; equal times leave in post order. Once closed
/// the queue accepts nothing and wakes the dispatch thread so it can exit.
#[derive(Default)]
pub(crate) struct Dispatcher {
    queue: Mutex<DispatchQueue>,
    wakeup: Condvar,
    sequence: AtomicU64,
}

#[derive(Default)]
struct DispatchQueue {
    pending: BinaryHeap<Reverse<PendingMessage>>,
    closed: bool,
}

impl Dispatcher {
    /// Schedules `message_id` for delivery after `delay`.
    ///
    /// Returns `false` if the queue is closed or the delay cannot be
    /// represented as a point in time.
    pub(crate) fn enqueue(&self, message_id: MessageId, payload: Option<Payload>, delay: Duration) -> bool {
        let Some(due) = Instant::now().checked_add(delay) else {
            warn!(message_id, ?delay, "Delay out of range; message dropped");
            return false;
        };
        let mut queue = self.queue.lock();
        if queue.closed {
            trace!(message_id, "Queue closed; message dropped");
            return false;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        queue
            .pending
            .push(Reverse(PendingMessage::new(message_id, payload, due, sequence)));
        trace!(message_id, sequence, ?delay, queued = queue.pending.len(), "Message queued");
        drop(queue);
        self.wakeup.notify_one();
        true
    }

    /// Blocks until the earliest message is due and removes it.
    ///
    /// Returns `None` once the queue is closed.
    pub(crate) fn next_due(&self) -> Option<PendingMessage> {
        let mut queue = self.queue.lock();
        loop {
            if queue.closed {
                return None;
            }
            match queue.pending.peek().map(|Reverse(head)| head.due) {
                Some(due) if due <= Instant::now() => {
                    return queue.pending.pop().map(|Reverse(message)| message);
                }
                Some(due) => {
                    self.wakeup.wait_until(&mut queue, due);
                }
                None => self.wakeup.wait(&mut queue),
            }
        }
    }

    /// Closes the queue and hands back everything still waiting.
    ///
    /// The returned messages are dropped by the caller, outside any lock, since
    /// their payloads may own values whose `Drop` uses the bus.
    pub(crate) fn close(&self) -> Vec<PendingMessage> {
        let mut queue = self.queue.lock();
        queue.closed = true;
        let cancelled = std::mem::take(&mut queue.pending);
        drop(queue);
        self.wakeup.notify_all();
        cancelled.into_iter().map(|Reverse(message)| message).collect()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.queue.lock().pending.len()
    }
}

/// Invokes every resolved binding on each of its live instances.
///
/// Synchronous bindings run inline on the calling thread; asynchronous ones are
/// handed to `executor`. `released` is checked before every invocation so that
/// delivery stops as soon as the bus is released.
pub(crate) fn deliver(
    deliveries: Vec<Delivery>,
    payload: Option<&Payload>,
    executor: &AsyncExecutor,
    released: &AtomicBool,
) {
    for Delivery { binding, instances } in deliveries {
        for instance in instances {
            if released.load(Ordering::Acquire) {
                trace!(message_id = binding.message_id, "Bus released; delivery stopped");
                return;
            }
            if binding.asynchronous {
                let binding = Arc::clone(&binding);
                let payload = payload.cloned();
                let submitted = executor.submit(Box::new(move || {
                    binding.invoke_logged(instance.as_ref(), payload.as_ref());
                }));
                if !submitted {
                    return;
                }
            } else {
                binding.invoke_logged(instance.as_ref(), payload);
            }
        }
    }
}

/// Resolves and delivers `message_id` with the registry's current state.
pub(crate) fn dispatch(
    registry: &HandlerRegistry,
    executor: &AsyncExecutor,
    released: &AtomicBool,
    message_id: MessageId,
    payload: Option<&Payload>,
) {
    let deliveries = registry.resolve(message_id);
    if deliveries.is_empty() {
        trace!(message_id, "No bindings for message");
        return;
    }
    deliver(deliveries, payload, executor, released);
}
