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

use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

/// An ordered list that does not keep its elements alive.
///
/// Entries whose value has been dropped are skipped by every read and removed
/// on every mutation. Identity is pointer identity: two `Arc`s are the same
/// entry only if they share an allocation.
///
/// The bus does not use this for its own bookkeeping; registered handlers are
/// held strongly until they are unregistered.
///
/// ```rust
/// use std::sync::Arc;
/// use busline::util::WeakList;
///
/// let mut listeners = WeakList::new();
/// let kept = Arc::new("kept");
/// listeners.push(&kept);
/// listeners.push(&Arc::new("gone"));
///
/// assert_eq!(listeners.len(), 1);
/// assert_eq!(listeners.iter().map(|l| *l).collect::<Vec<_>>(), vec!["kept"]);
/// ```
pub struct WeakList<T> {
    entries: Vec<Weak<T>>,
}

impl<T> WeakList<T> {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends `value`.
    pub fn push(&mut self, value: &Arc<T>) {
        self.prune();
        self.entries.push(Arc::downgrade(value));
    }

    /// Inserts `value` before the live entry currently at `index`, or at the
    /// end if `index` is past the last live entry.
    pub fn insert(&mut self, index: usize, value: &Arc<T>) {
        self.prune();
        let index = index.min(self.entries.len());
        self.entries.insert(index, Arc::downgrade(value));
    }

    /// Removes the first entry pointing at `value`. Returns whether one was found.
    pub fn remove(&mut self, value: &Arc<T>) -> bool {
        self.prune();
        match self.position(value) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `value` is in the list.
    pub fn contains(&self, value: &Arc<T>) -> bool {
        self.position(value).is_some()
    }

    /// Number of live entries. Drops dead ones as a side effect.
    pub fn len(&mut self) -> usize {
        self.prune();
        self.entries.len()
    }

    /// Whether no live entry remains.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// The live entry at `index`, counting live entries only.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.iter().nth(index)
    }

    /// Iterates over the live entries in order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<T>> + '_ {
        self.entries.iter().filter_map(Weak::upgrade)
    }

    /// Drops entries whose value is gone.
    pub fn prune(&mut self) {
        self.entries.retain(|entry| entry.strong_count() > 0);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, value: &Arc<T>) -> Option<usize> {
        let target = Arc::as_ptr(value);
        self.entries
            .iter()
            .position(|entry| entry.strong_count() > 0 && entry.as_ptr() == target)
    }
}

impl<T> Default for WeakList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for WeakList<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakList")
            .field("entries", &self.entries.len())
            .finish()
    }
}
