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

use std::cmp::Ordering;
use std::time::Instant;

use derive_new::new;
use static_assertions::assert_impl_all;

use crate::message::{MessageId, Payload};

/// A posted message waiting on the dispatch queue.
///
/// Ordered by scheduled delivery time, then by `sequence` (the order in which
/// messages were posted) so that messages due at the same instant leave the
/// queue first-in, first-out.
#[derive(new, Debug, Clone)]
pub(crate) struct PendingMessage {
    pub(crate) message_id: MessageId,
    pub(crate) payload: Option<Payload>,
    pub(crate) due: Instant,
    pub(crate) sequence: u64,
}

impl PartialEq for PendingMessage {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for PendingMessage {}

impl PartialOrd for PendingMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

assert_impl_all!(PendingMessage: Send);

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;
    use std::time::Duration;

    use super::*;

    #[test]
    fn earliest_due_then_post_order() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(PendingMessage::new(1, None, now + Duration::from_millis(50), 0)));
        heap.push(Reverse(PendingMessage::new(2, None, now, 1)));
        heap.push(Reverse(PendingMessage::new(3, None, now, 2)));

        let order: Vec<MessageId> = std::iter::from_fn(|| heap.pop().map(|Reverse(m)| m.message_id)).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
