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

use busline::prelude::MessageId;

/// No payload; handled by `Recorder` and `Listener`.
pub const PING: MessageId = 1;
/// Carries a `u32`; `Recorder` records it, `Listener` ignores the payload.
pub const SEQUENCE: MessageId = 2;
/// Carries a [`Quote`].
pub const QUOTE: MessageId = 3;
/// Blocks the dispatch thread inside `Gate` until the gate opens.
pub const GATE: MessageId = 4;
/// Handled by failing and panicking handlers, then by `Survivor`.
pub const FAULT: MessageId = 5;
/// Makes `Releaser` release the bus from inside a handler.
pub const RELEASE: MessageId = 6;
/// Slow asynchronous work.
pub const WORK: MessageId = 7;

/// A typed payload for asynchronous delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub symbol: String,
    pub price: u64,
}
