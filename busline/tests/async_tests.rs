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


use std::sync::atomic::Ordering;
use std::sync::Arc;

use busline::config::ExecutorConfig;
use busline::prelude::*;
use busline_test::prelude::*;

use crate::setup::handlers::*;
use crate::setup::messages::{Quote, QUOTE, WORK};
use crate::setup::{new_bus, wait_until, PATIENCE};

mod setup;

fn quote() -> Quote {
    Quote {
        symbol: "ACME".to_string(),
        price: 1_250,
    }
}

#[busline_test]
fn sync_and_async_bindings_share_one_post() -> anyhow::Result<()> {
    let bus = new_bus();
    let sync_side = Arc::new(SyncSide::default());
    let async_side = Arc::new(AsyncSide::default());
    bus.register(Arc::clone(&sync_side))?;
    bus.register(Arc::clone(&async_side))?;

    bus.post_with(QUOTE, Payload::new(quote()));

    assert!(wait_until(PATIENCE, || {
        sync_side.threads.lock().len() == 1 && async_side.seen.lock().len() == 1
    }));
    assert_eq!(*sync_side.threads.lock(), vec!["busline-dispatch"]);
    let (thread, received) = async_side.seen.lock()[0].clone();
    assert!(thread.starts_with("async_handle #"), "ran on {thread}");
    assert_eq!(received, quote());
    Ok(())
}

#[busline_test]
fn immediate_post_still_hands_async_bindings_to_the_pool() -> anyhow::Result<()> {
    let bus = new_bus();
    let sync_side = Arc::new(SyncSide::default());
    let async_side = Arc::new(AsyncSide::default());
    bus.register(Arc::clone(&sync_side))?;
    bus.register(Arc::clone(&async_side))?;

    let caller = thread_name();
    bus.post_immediate_with(QUOTE, Payload::new(quote()));

    assert_eq!(*sync_side.threads.lock(), vec![caller]);
    assert!(wait_until(PATIENCE, || async_side.seen.lock().len() == 1));
    assert!(async_side.seen.lock()[0].0.starts_with("async_handle #"));
    Ok(())
}

#[busline_test]
fn worker_pool_bounds_concurrency() -> anyhow::Result<()> {
    let bus = MessageBus::with_config(BusConfig {
        executor: ExecutorConfig {
            worker_threads: 2,
            ..ExecutorConfig::default()
        },
        ..BusConfig::default()
    })?;
    let worker = Arc::new(SlowWorker::default());
    bus.register(Arc::clone(&worker))?;

    for _ in 0..6 {
        bus.post(WORK);
    }

    assert!(wait_until(PATIENCE, || worker.done.load(Ordering::SeqCst) == 6));
    let peak = worker.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak concurrency {peak}");
    Ok(())
}

#[busline_test]
fn worker_threads_use_the_configured_prefix() -> anyhow::Result<()> {
    let bus = MessageBus::with_config(BusConfig {
        executor: ExecutorConfig {
            thread_name_prefix: "quote-worker".to_string(),
            priority: WorkerPriority::Normal,
            ..ExecutorConfig::default()
        },
        ..BusConfig::default()
    })?;
    let async_side = Arc::new(AsyncSide::default());
    bus.register(Arc::clone(&async_side))?;

    bus.post_with(QUOTE, Payload::new(quote()));

    assert!(wait_until(PATIENCE, || async_side.seen.lock().len() == 1));
    assert!(async_side.seen.lock()[0].0.starts_with("quote-worker #"));
    Ok(())
}

#[busline_test]
fn async_payload_mismatch_is_logged() -> anyhow::Result<()> {
    let bus = new_bus();
    let async_side = Arc::new(AsyncSide::default());
    bus.register(Arc::clone(&async_side))?;

    bus.post_with(QUOTE, Payload::new(17_i64));

    assert!(captured_logs().wait_for(tracing::Level::ERROR, "found i64", PATIENCE));
    assert!(async_side.seen.lock().is_empty());
    Ok(())
}
