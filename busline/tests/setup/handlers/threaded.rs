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
use std::thread;
use std::time::Duration;

use busline::prelude::*;
use parking_lot::Mutex;

use super::thread_name;
use crate::setup::messages::{Quote, QUOTE, WORK};

/// Synchronous, parameterless `QUOTE` handler recording which thread ran it.
#[derive(Default)]
pub struct SyncSide {
    pub threads: Mutex<Vec<String>>,
}

#[message_handlers]
impl SyncSide {
    #[handle(QUOTE)]
    fn on_quote(&self) {
        self.threads.lock().push(thread_name());
    }
}

/// Asynchronous `QUOTE` handler recording the thread and the payload.
#[derive(Default)]
pub struct AsyncSide {
    pub seen: Mutex<Vec<(String, Quote)>>,
}

#[message_handlers]
impl AsyncSide {
    #[handle_async(QUOTE)]
    fn on_quote(&self, quote: &Quote) {
        self.seen.lock().push((thread_name(), quote.clone()));
    }
}

/// Asynchronous handler that takes a while and tracks how many run at once.
#[derive(Default)]
pub struct SlowWorker {
    running: AtomicUsize,
    pub peak: AtomicUsize,
    pub done: AtomicUsize,
}

#[message_handlers]
impl SlowWorker {
    #[handle_async(WORK)]
    fn work(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}
