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
use std::time::Duration;

use busline::prelude::*;
use parking_lot::{Condvar, Mutex};

use crate::setup::messages::GATE;

/// Holds the dispatch thread inside a handler until [`Gate::open`] is called.
#[derive(Default)]
pub struct Gate {
    entered: AtomicBool,
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }
}

#[message_handlers]
impl Gate {
    #[handle(GATE)]
    fn hold(&self) {
        self.entered.store(true, Ordering::SeqCst);
        let mut open = self.open.lock();
        let _ = self
            .opened
            .wait_while_for(&mut open, |open| !*open, Duration::from_secs(5));
    }
}
