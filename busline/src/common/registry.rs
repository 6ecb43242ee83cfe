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

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use crate::common::binding::HandlerBinding;
use crate::common::types::{instance_key, Instance};
use crate::common::Bindings;
use crate::message::{BusError, MessageId};
use crate::traits::MessageHandler;

/// Tracks which methods handle which message ids and which objects are live.
///
/// Three tables are kept behind a single lock so that a registration, an
/// unregistration or a release is observed atomically by the dispatcher:
///
/// * bindings per declaring type, computed once per type and then cached,
/// * live instances per declaring type (set semantics, registration order),
/// * bindings per message id across all types (registration order).
///
/// Mutations take the write lock; [`resolve`](Self::resolve) only reads and
/// returns a snapshot, so no lock is held while handlers run.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    tables: RwLock<Tables>,
}

/// Registry contents; handed back by [`HandlerRegistry::clear`].
#[derive(Default)]
pub(crate) struct Tables {
    bindings_by_type: HashMap<TypeId, Vec<Arc<HandlerBinding>>>,
    live: HashMap<TypeId, Vec<LiveInstance>>,
    by_message: HashMap<MessageId, Vec<Arc<HandlerBinding>>>,
}

struct LiveInstance {
    key: usize,
    instance: Instance,
}

/// One binding together with the instances it should be invoked on.
pub(crate) struct Delivery {
    pub(crate) binding: Arc<HandlerBinding>,
    pub(crate) instances: Vec<Instance>,
}

impl HandlerRegistry {
    /// Registers `object`, scanning its type first if it has not been seen.
    ///
    /// A failed scan leaves every table untouched.
    #[instrument(skip(self, object), fields(owner = type_name::<T>()), level = "debug")]
    pub(crate) fn register<T: MessageHandler>(&self, object: Arc<T>) -> Result<(), BusError> {
        let type_id = TypeId::of::<T>();
        let cached = self.tables.read().bindings_by_type.contains_key(&type_id);
        let scanned = if cached {
            None
        } else {
            let mut bindings = Bindings::<T>::new();
            T::declare(&mut bindings);
            Some(bindings.into_bindings()?)
        };

        let mut tables = self.tables.write();
        if let Some(discovered) = scanned {
            // Another caller may have finished scanning the same type meanwhile.
            if !tables.bindings_by_type.contains_key(&type_id) {
                debug!(count = discovered.len(), "Caching handler bindings");
                for binding in &discovered {
                    let slot = tables.by_message.entry(binding.message_id).or_default();
                    if !slot.iter().any(|existing| existing == binding) {
                        slot.push(Arc::clone(binding));
                    }
                }
                tables.bindings_by_type.insert(type_id, discovered);
            }
        }

        let instance: Instance = object;
        let key = instance_key(&instance);
        let live = tables.live.entry(type_id).or_default();
        if live.iter().any(|entry| entry.key == key) {
            trace!("Instance already registered");
        } else {
            live.push(LiveInstance { key, instance });
            trace!(live = live.len(), "Instance registered");
        }
        Ok(())
    }

    /// Removes `object` from the live set of its type.
    ///
    /// Cached bindings stay in place for future registrations of the type.
    /// Returns `false` if the object was not registered.
    pub(crate) fn unregister<T: MessageHandler>(&self, object: &Arc<T>) -> bool {
        let key = Arc::as_ptr(object).cast::<()>() as usize;
        let mut tables = self.tables.write();
        let Some(live) = tables.live.get_mut(&TypeId::of::<T>()) else {
            return false;
        };
        let before = live.len();
        live.retain(|entry| entry.key != key);
        let removed = live.len() != before;
        trace!(owner = type_name::<T>(), removed, "Unregister");
        removed
    }

    /// Returns, in registration order, every binding for `message_id` paired
    /// with the currently live instances of its owning type.
    pub(crate) fn resolve(&self, message_id: MessageId) -> Vec<Delivery> {
        let tables = self.tables.read();
        let Some(bindings) = tables.by_message.get(&message_id) else {
            return Vec::new();
        };
        bindings
            .iter()
            .map(|binding| Delivery {
                binding: Arc::clone(binding),
                instances: tables
                    .live
                    .get(&binding.owner)
                    .map(|live| live.iter().map(|entry| Arc::clone(&entry.instance)).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Empties the registry and returns what it held.
    ///
    /// The bus may hold the last strong reference to an instance, so the
    /// caller drops the result once no bus lock is held.
    pub(crate) fn clear(&self) -> Tables {
        std::mem::take(&mut *self.tables.write())
    }

    /// Number of live instances of `T`.
    pub(crate) fn live_count<T: MessageHandler>(&self) -> usize {
        self.tables
            .read()
            .live
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }

    /// Whether bindings for `T` are cached.
    #[cfg(test)]
    pub(crate) fn is_scanned<T: MessageHandler>(&self) -> bool {
        self.tables.read().bindings_by_type.contains_key(&TypeId::of::<T>())
    }
}
