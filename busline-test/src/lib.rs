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

//! Test support for code built on Busline.
//!
//! * [`busline_test`](prelude::busline_test): marks a test function; sets up
//!   tracing and runs the body inside a span named after the test.
//! * [`captured_logs`]: every event recorded since tracing was set up, so
//!   tests can assert on failures the bus logs instead of returning.

use std::fmt::{self, Write as _};
use std::sync::Once;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// The test attribute and log helpers.
pub mod prelude {
    pub use busline_test_macro::busline_test;

    pub use crate::{captured_logs, init_test_tracing, CapturedLogs};
}

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

static INIT: Once = Once::new();

lazy_static! {
    static ref CAPTURED: CapturedLogs = CapturedLogs::default();
}

/// Installs the global test subscriber once per process.
///
/// Output goes through the test writer so it is only shown for failing tests.
/// The console filter comes from `RUST_LOG`, defaulting to `busline=trace`;
/// capture sees every event regardless.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("busline=trace"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .without_time()
                    .with_target(true)
                    .with_test_writer()
                    .with_filter(filter),
            )
            .with(CaptureLayer)
            .try_init();
    });
}

/// Events captured by the test subscriber.
pub fn captured_logs() -> &'static CapturedLogs {
    &CAPTURED
}

/// One captured event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Event level
    pub level: Level,
    /// Event target
    pub target: String,
    /// Message followed by `name=value` fields
    pub text: String,
}

/// Shared record of captured events.
#[derive(Default)]
pub struct CapturedLogs {
    events: Mutex<Vec<CapturedEvent>>,
}

impl CapturedLogs {
    /// Whether an event at `level` contains `needle` in its text.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| event.level == level && event.text.contains(needle))
    }

    /// Polls [`contains`](Self::contains) until it holds or `timeout` passes.
    pub fn wait_for(&self, level: Level, needle: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.contains(level, needle) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Captured events whose text contains `needle`.
    pub fn matching(&self, needle: &str) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.text.contains(needle))
            .cloned()
            .collect()
    }
}

struct CaptureLayer;

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = TextVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        CAPTURED.events.lock().push(CapturedEvent {
            level: *meta.level(),
            target: meta.target().to_string(),
            text: visitor.text,
        });
    }
}

#[derive(Default)]
struct TextVisitor {
    text: String,
}

impl Visit for TextVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        if field.name() == "message" {
            let _ = write!(self.text, "{value:?}");
        } else {
            let _ = write!(self.text, "{}={value:?}", field.name());
        }
    }
}
