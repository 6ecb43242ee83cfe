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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use crate::common::config::{ExecutorConfig, WorkerPriority};
use crate::common::types::Job;
use crate::message::BusError;

/// Fixed-size worker pool for handlers marked asynchronous.
///
/// Backed by a dedicated multi-threaded tokio runtime whose worker count is the
/// pool size. Jobs are fire-and-forget: nothing about their outcome flows back
/// to the submitter.
pub(crate) struct AsyncExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    tracker: TaskTracker,
    cancel_token: CancellationToken,
    priority: WorkerPriority,
    worker_threads: usize,
}

impl AsyncExecutor {
    pub(crate) fn new(config: &ExecutorConfig) -> Result<Self, BusError> {
        let worker_threads = if config.worker_threads == 0 {
            warn!("executor.worker_threads is 0; using a single worker");
            1
        } else {
            config.worker_threads
        };

        let prefix = config.thread_name_prefix.clone();
        let next_index = AtomicUsize::new(0);
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name_fn(move || format!("{prefix} #{}", next_index.fetch_add(1, Ordering::Relaxed)))
            .build()
            .map_err(|source| BusError::Spawn {
                component: "async executor",
                source,
            })?;
        debug!(worker_threads, priority = ?config.priority, "Async executor started");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            tracker: TaskTracker::new(),
            cancel_token: CancellationToken::new(),
            priority: config.priority,
            worker_threads,
        })
    }

    /// Queues `job` on the pool. Returns `false` if the pool was shut down.
    pub(crate) fn submit(&self, job: Job) -> bool {
        if self.cancel_token.is_cancelled() || self.tracker.is_closed() {
            trace!("Executor is shut down; dropping job");
            return false;
        }
        let cancel_token = self.cancel_token.clone();
        let priority = self.priority;
        self.tracker.spawn_on(
            async move {
                if priority == WorkerPriority::Background {
                    tokio::task::yield_now().await;
                }
                if cancel_token.is_cancelled() {
                    trace!("Discarding queued job after shutdown");
                    return;
                }
                job();
            },
            &self.handle,
        );
        true
    }

    /// Stops the pool.
    ///
    /// Jobs that have not started are discarded either way. With `force` the
    /// runtime is abandoned without waiting for running jobs; otherwise the
    /// caller waits up to `grace` for them, unless it is itself inside an async
    /// context.
    pub(crate) fn shutdown(&self, force: bool, grace: Duration) {
        let Some(runtime) = self.runtime.lock().take() else {
            trace!("Executor already shut down");
            return;
        };
        self.tracker.close();
        if force {
            self.cancel_token.cancel();
        }
        let in_flight = self.tracker.len();
        if force || Handle::try_current().is_ok() {
            debug!(in_flight, force, "Shutting down async executor in the background");
            runtime.shutdown_background();
        } else {
            debug!(in_flight, ?grace, "Draining async executor");
            runtime.shutdown_timeout(grace);
        }
    }

    pub(crate) const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    #[cfg(test)]
    pub(crate) fn is_shut_down(&self) -> bool {
        self.tracker.is_closed()
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
