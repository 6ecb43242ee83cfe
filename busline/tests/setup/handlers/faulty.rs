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


use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use anyhow::anyhow;
use busline::prelude::*;

use crate::setup::messages::{FAULT, PING, SEQUENCE};

/// Returns an error every time.
#[derive(Default)]
pub struct Failing {
    pub calls: AtomicUsize,
}

#[message_handlers]
impl Failing {
    #[handle(FAULT)]
    fn fail(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("failing-handler-marker"))
    }
}

/// Panics every time.
#[derive(Default)]
pub struct Panicky {
    pub calls: AtomicUsize,
}

#[message_handlers]
impl Panicky {
    #[handle(FAULT)]
    fn explode(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("panicky-handler-marker");
    }
}

/// Panics every time, on the worker pool.
#[derive(Default)]
pub struct AsyncPanicky {
    pub calls: AtomicUsize,
}

#[message_handlers]
impl AsyncPanicky {
    #[handle_async(FAULT)]
    fn explode(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("async-panicky-marker");
    }
}

/// Registered after the faulty handlers; must still be reached.
#[derive(Default)]
pub struct Survivor {
    pub calls: AtomicUsize,
}

#[message_handlers]
impl Survivor {
    #[handle(FAULT)]
    fn carry_on(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Marks one method both ways.
pub struct Conflicted;

#[message_handlers]
impl Conflicted {
    #[handle(PING)]
    #[handle_async(PING)]
    fn both(&self) {}
}

/// Declares a handler with two parameters.
pub struct TwoParams;

#[message_handlers]
impl TwoParams {
    #[handle(SEQUENCE)]
    fn pair(&self, _first: &u32, _second: &u32) {}
}

/// Uses a bare `#[handle]`, which binds id 0.
#[derive(Default)]
pub struct ZeroHandler {
    pub calls: AtomicUsize,
}

#[message_handlers]
impl ZeroHandler {
    #[handle]
    fn on_zero(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Takes its payload by value.
#[derive(Default)]
pub struct ByValue {
    pub total: AtomicU64,
}

#[message_handlers]
impl ByValue {
    #[handle(SEQUENCE)]
    fn add(&self, n: u32) {
        self.total.fetch_add(u64::from(n), Ordering::SeqCst);
    }
}
