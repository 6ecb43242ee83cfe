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

use busline::prelude::*;
use parking_lot::Mutex;

use super::thread_name;
use crate::setup::messages::{PING, RELEASE};

/// Releases the bus it was given from inside its handler.
#[derive(Default)]
pub struct Releaser {
    bus: Mutex<Option<MessageBus>>,
    pub released_inside: AtomicBool,
    pub thread: Mutex<Option<String>>,
}

impl Releaser {
    pub fn new(bus: &MessageBus) -> Arc<Self> {
        Arc::new(Self {
            bus: Mutex::new(Some(bus.clone())),
            ..Self::default()
        })
    }
}

#[message_handlers]
impl Releaser {
    #[handle(RELEASE)]
    fn release_bus(&self) {
        *self.thread.lock() = Some(thread_name());
        let bus = self.bus.lock().take();
        if let Some(bus) = bus {
            bus.release();
            self.released_inside.store(bus.is_released(), Ordering::SeqCst);
        }
    }
}

/// Uses the bus from `Drop`. Registered with the bus, which then holds the last
/// strong reference.
pub struct PostsOnDrop {
    bus: MessageBus,
    dropped: Arc<AtomicBool>,
}

impl PostsOnDrop {
    pub fn new(bus: &MessageBus, dropped: &Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            bus: bus.clone(),
            dropped: Arc::clone(dropped),
        })
    }
}

#[message_handlers]
impl PostsOnDrop {
    #[handle(PING)]
    fn on_ping(&self) {}
}

impl Drop for PostsOnDrop {
    fn drop(&mut self) {
        self.bus.post(PING);
        self.bus.post_immediate(PING);
        let _ = self.bus.registered_count::<PostsOnDrop>();
        self.bus.release();
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Payload that posts to the bus when the last copy is dropped.
pub struct PostsOnDropPayload {
    pub bus: MessageBus,
    pub dropped: Arc<AtomicBool>,
}

impl Drop for PostsOnDropPayload {
    fn drop(&mut self) {
        self.bus.post(PING);
        self.dropped.store(true, Ordering::SeqCst);
    }
}
