//! Message-level types: ids, payloads, queued messages and errors.

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

pub use bus_error::{BusError, InvocationError};
pub use payload::Payload;
pub(crate) use pending_message::PendingMessage;

/// Integer key identifying a class of event.
pub type MessageId = i32;

/// Registration and invocation errors.
mod bus_error;
/// The opaque value carried with a message.
mod payload;
/// Queue entries awaiting the dispatch thread.
mod pending_message;
