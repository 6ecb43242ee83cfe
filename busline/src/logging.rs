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

//! Log output for applications embedding the bus.
//!
//! The bus reports everything through `tracing`. [`init`] installs a global
//! subscriber writing to the console and optionally to a daily rolling file,
//! as described by [`LoggingConfig`]. Additional destinations plug in as
//! [`LogSink`]s via [`init_with_sinks`], or as a [`SinkLayer`] on a
//! subscriber the application builds itself.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::common::config::LoggingConfig;

/// A destination for log lines.
pub trait LogSink: Send + Sync + 'static {
    /// Receives one event. `tag` is the event's target.
    fn on_log(&self, level: Level, tag: &str, message: &str);
}

/// A `tracing` layer forwarding events to a [`LogSink`].
///
/// Events below the minimum level, or all events while the layer is not
/// visible, are skipped.
pub struct SinkLayer {
    sink: Arc<dyn LogSink>,
    min_level: LevelFilter,
    visible: bool,
}

impl SinkLayer {
    /// Forwards every event to `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_level: LevelFilter::TRACE,
            visible: true,
        }
    }

    /// Skips events less severe than `level`.
    #[must_use]
    pub const fn with_min_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    /// Turns forwarding on or off.
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.visible || *meta.level() > self.min_level {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.sink.on_log(*meta.level(), meta.target(), &visitor.finish());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={value:?}", field.name());
        }
    }
}

/// Keeps the file writer flushing. Dropping it stops file output.
#[derive(Debug)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber described by `config`.
///
/// Returns `None` if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Option<LoggingGuard> {
    init_with_sinks(config, Vec::new())
}

/// Like [`init`], additionally forwarding every event to each of `sinks`.
pub fn init_with_sinks(config: &LoggingConfig, sinks: Vec<Arc<dyn LogSink>>) -> Option<LoggingGuard> {
    let console = config.console_visible.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_filter(parse_level(&config.console_level))
    });

    let (file, file_guard) = match &config.log_directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "busline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(parse_level(&config.file_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let sinks: Vec<SinkLayer> = sinks.into_iter().map(SinkLayer::new).collect();

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(sinks)
        .try_init()
        .ok()?;
    Some(LoggingGuard { _file: file_guard })
}

/// Parses a level name, accepting `verbose` as `trace`. Unknown names mean `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    if name.eq_ignore_ascii_case("verbose") {
        return LevelFilter::TRACE;
    }
    name.parse().unwrap_or(LevelFilter::INFO)
}
