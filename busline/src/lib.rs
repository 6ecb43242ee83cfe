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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Busline
//!
//! An in-process message bus. Components register handler objects whose
//! methods are bound to integer message ids; posting a message delivers it to
//! every live registered object whose type binds that id.
//!
//! ## Key Concepts
//!
//! - **Bindings**: A handler type implements [`MessageHandler`](prelude::MessageHandler),
//!   usually through the `#[message_handlers]` attribute, listing which method
//!   handles which id and whether it runs synchronously or asynchronously.
//! - **Dispatch thread**: Posted messages wait on a time-ordered queue drained by
//!   one dedicated thread. Synchronous handlers run there, in turn.
//! - **Worker pool**: Handlers marked asynchronous run on a fixed pool of
//!   worker threads instead.
//! - **Immediate delivery**: `post_immediate` bypasses the queue and runs
//!   synchronous handlers on the caller's thread.
//! - **Release**: An irreversible shutdown after which posts do nothing.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use busline::prelude::*;
//!
//! const PRICE_CHANGED: MessageId = 1;
//!
//! #[derive(Default)]
//! struct Ticker {
//!     last: AtomicU64,
//! }
//!
//! #[message_handlers]
//! impl Ticker {
//!     #[handle(PRICE_CHANGED)]
//!     fn on_price(&self, price: &u64) {
//!         self.last.store(*price, Ordering::SeqCst);
//!     }
//! }
//!
//! # fn main() -> Result<(), BusError> {
//! let bus = MessageBus::with_config(BusConfig::default())?;
//! let ticker = Arc::new(Ticker::default());
//! bus.register(Arc::clone(&ticker))?;
//!
//! bus.post_immediate_with(PRICE_CHANGED, Payload::new(42_u64));
//! assert_eq!(ticker.last.load(Ordering::SeqCst), 42);
//! bus.release();
//! # Ok(())
//! # }
//! ```

extern crate self as busline;

/// Core runtime components: the bus, the registry, the dispatcher and the worker pool.
pub(crate) mod common;

/// Defines message ids, payloads and errors.
pub(crate) mod message;

/// Defines the traits handler types implement.
pub(crate) mod traits;

/// Console, file and pluggable log output.
pub mod logging;

/// Helpers that are not part of the bus itself.
pub mod util;

/// Configuration types and the process-wide configuration.
pub mod config {
    pub use crate::common::config::{
        BusConfig, DispatcherConfig, ExecutorConfig, LoggingConfig, TimeoutConfig, WorkerPriority, CONFIG,
    };
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `busline-macro`)
/// *   [`busline_macro::message_handlers`]: Generates a `MessageHandler` implementation from
///     methods marked `#[handle(id)]` or `#[handle_async(id)]`.
///
/// ## Core Types
/// *   [`crate::common::MessageBus`]: The bus handle.
/// *   [`crate::common::Bindings`], [`crate::common::BindingDecl`], [`crate::common::Marking`]:
///     Handler declarations.
/// *   [`crate::common::BusConfig`]: Bus configuration.
/// *   [`crate::message::Payload`], [`crate::message::MessageId`]: What gets posted.
/// *   [`crate::message::BusError`], [`crate::message::InvocationError`]: Failures.
/// *   [`crate::traits::MessageHandler`], [`crate::traits::HandlerOutcome`]: Handler traits.
pub mod prelude {
    pub use busline_macro::message_handlers;

    pub use crate::common::{BindingDecl, Bindings, BusConfig, Marking, MessageBus, WorkerPriority};
    pub use crate::message::{BusError, InvocationError, MessageId, Payload};
    pub use crate::traits::{HandlerOutcome, MessageHandler};
}
