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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::common::config::BusConfig;
use crate::common::dispatcher::{self, Dispatcher};
use crate::common::executor::AsyncExecutor;
use crate::common::registry::HandlerRegistry;
use crate::message::BusError;

/// Internal state shared by every [`MessageBus`](crate::common::MessageBus)
/// handle and by the dispatch thread.
pub(crate) struct BusInner {
    pub(crate) registry: HandlerRegistry,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) executor: AsyncExecutor,

    /// Set once by `release`, never cleared.
    pub(crate) released: AtomicBool,

    /// Held shared by register, unregister and post; held exclusively by release.
    pub(crate) lifecycle: RwLock<()>,

    pub(crate) config: BusConfig,

    dispatch_thread: Mutex<Option<DispatchThread>>,
    exited: Mutex<bool>,
    exited_signal: Condvar,
}

struct DispatchThread {
    id: ThreadId,
    handle: JoinHandle<()>,
}

impl BusInner {
    /// Builds the shared state and starts the dispatch thread.
    pub(crate) fn start(config: BusConfig) -> Result<Arc<Self>, BusError> {
        let executor = AsyncExecutor::new(&config.executor)?;
        let inner = Arc::new(Self {
            registry: HandlerRegistry::default(),
            dispatcher: Dispatcher::default(),
            executor,
            released: AtomicBool::new(false),
            lifecycle: RwLock::new(()),
            config,
            dispatch_thread: Mutex::new(None),
            exited: Mutex::new(false),
            exited_signal: Condvar::new(),
        });

        let worker = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name(inner.config.dispatcher.thread_name.clone())
            .spawn(move || worker.run_dispatch_loop())
            .map_err(|source| {
                inner.executor.shutdown(true, Duration::ZERO);
                BusError::Spawn {
                    component: "dispatch thread",
                    source,
                }
            })?;
        *inner.dispatch_thread.lock() = Some(DispatchThread {
            id: handle.thread().id(),
            handle,
        });
        debug!(
            thread = %inner.config.dispatcher.thread_name,
            workers = inner.executor.worker_threads(),
            "Message bus started"
        );
        Ok(inner)
    }

    fn run_dispatch_loop(&self) {
        trace!("Dispatch loop running");
        while let Some(message) = self.dispatcher.next_due() {
            if self.released.load(Ordering::Acquire) {
                break;
            }
            trace!(message_id = message.message_id, sequence = message.sequence, "Delivering");
            dispatcher::dispatch(
                &self.registry,
                &self.executor,
                &self.released,
                message.message_id,
                message.payload.as_ref(),
            );
        }
        trace!("Dispatch loop exited");
        *self.exited.lock() = true;
        self.exited_signal.notify_all();
    }

    /// Irreversibly shuts the bus down. Later calls do nothing.
    pub(crate) fn release(&self) {
        let (cancelled, cleared) = {
            let _exclusive = self.lifecycle.write();
            if self.released.swap(true, Ordering::AcqRel) {
                trace!("Bus already released");
                return;
            }
            let cancelled = self.dispatcher.close();
            self.executor
                .shutdown(true, self.config.release_join_timeout());
            let cleared = self.registry.clear();
            info!(cancelled = cancelled.len(), "Message bus released");
            (cancelled, cleared)
        };
        // Instances and payloads may use the bus from `Drop`; no lock is held here.
        drop(cancelled);
        drop(cleared);
        self.join_dispatch_thread();
    }

    fn join_dispatch_thread(&self) {
        let Some(dispatch) = self.dispatch_thread.lock().take() else {
            return;
        };
        if dispatch.id == thread::current().id() {
            trace!("Released from the dispatch thread; not joining");
            return;
        }

        let timeout = self.config.release_join_timeout();
        let mut exited = self.exited.lock();
        if !*exited {
            let _ = self.exited_signal.wait_while_for(&mut exited, |exited| !*exited, timeout);
        }
        if *exited {
            drop(exited);
            if dispatch.handle.join().is_err() {
                warn!("Dispatch thread panicked");
            }
        } else {
            warn!(?timeout, "Dispatch thread still busy after release; detaching it");
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
