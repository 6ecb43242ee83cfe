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


use std::sync::Arc;

use busline::prelude::*;
use parking_lot::Mutex;

use crate::setup::messages::{PING, SEQUENCE};

/// Events recorded by every handler sharing the log, in delivery order.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Records `"{name}:ping"` and `"{name}:seq{n}"`.
pub struct Recorder {
    name: &'static str,
    log: EventLog,
}

impl Recorder {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: Arc::clone(log),
        })
    }

    fn push(&self, event: impl std::fmt::Display) {
        self.log.lock().push(format!("{}:{event}", self.name));
    }
}

#[message_handlers]
impl Recorder {
    #[handle(PING)]
    fn on_ping(&self) {
        self.push("ping");
    }

    #[handle(SEQUENCE)]
    fn on_sequence(&self, n: &u32) {
        self.push(format_args!("seq{n}"));
    }
}

/// A second type bound to the same ids. Ignores `SEQUENCE` payloads.
pub struct Listener {
    log: EventLog,
}

impl Listener {
    pub fn new(log: &EventLog) -> Arc<Self> {
        Arc::new(Self { log: Arc::clone(log) })
    }
}

#[message_handlers]
impl Listener {
    #[handle(PING)]
    fn on_ping(&self) {
        self.log.lock().push("listener:ping".to_string());
    }

    #[handle(SEQUENCE)]
    fn on_sequence(&self) {
        self.log.lock().push("listener:seq".to_string());
    }
}
